//! Progress reporting.
//!
//! The pipeline only derives numbers; presentation belongs to whatever shell
//! is driving the run. Sinks must tolerate being called once per image/row.

/// A single progress observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Items finished so far within the current context.
    pub completed: usize,

    /// Total items in the current context.
    pub total: usize,

    /// Rounded percentage, 0..=100.
    pub percent: u8,

    /// Human-readable status line, e.g. `Sheet "Paris": image 2/5`.
    pub label: String,
}

impl ProgressUpdate {
    pub fn new(completed: usize, total: usize, label: impl Into<String>) -> Self {
        let percent = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            completed,
            total,
            percent,
            label: label.into(),
        }
    }
}

/// Receiver for progress updates; implemented by the shell.
pub trait ProgressSink: Send + Sync {
    fn update(&self, progress: ProgressUpdate);
}

/// Sink that swallows everything; used in tests and headless runs.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn update(&self, _progress: ProgressUpdate) {}
}
