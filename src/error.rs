//! Error taxonomy for export and update runs.
//!
//! Only three classes abort a run: input validation, spreadsheet I/O and
//! file I/O. Everything that goes wrong with a single image is downgraded to
//! a skip and collected in the run diagnostics instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// The selected folder contained no files with an `image/*` media type.
    #[error("no valid image files found in the selected folder")]
    NoImages,

    /// The version label is empty or whitespace-only.
    #[error("version label must not be empty")]
    EmptyVersionLabel,

    /// The version label already appears in the report's header row.
    #[error("version label \"{0}\" already exists in the report")]
    DuplicateVersionLabel(String),

    /// The recognition client could not be constructed.
    #[error("recognition client error: {0}")]
    Recognition(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Loading or serializing the workbook failed.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
}

impl ReportError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
