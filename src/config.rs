//! Run configuration.
//!
//! The shell reads its inputs once, builds one of these values and hands it
//! to the pipeline. The core never touches flags, environment variables or
//! any other mutable outside state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default endpoint of the recognition service, overridable via
/// `PHOTOREPORT_OCR_ENDPOINT` (resolved by the shell, not here).
pub const DEFAULT_OCR_ENDPOINT: &str = "http://localhost:5000/api/ocr";

/// Settings for the remote text-recognition call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    /// Full URL of the OCR endpoint.
    pub endpoint: String,

    /// Language code the service should read the image in (e.g. "ch", "en", "vie").
    pub source_language: String,

    /// Target language for translation; `None` disables the translation step.
    pub target_language: Option<String>,
}

/// Configuration for a fresh export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Folder whose images become the report.
    pub folder: PathBuf,

    /// Directory the `<folderName>.xlsx` artifact is written into.
    pub output_dir: PathBuf,

    /// `None` skips recognition entirely: rows get empty text/translation
    /// and no network call is made.
    pub recognition: Option<RecognitionConfig>,
}

/// Configuration for appending a version column to an existing report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Previously exported report to extend.
    pub report: PathBuf,

    /// Folder of replacement images, matched to rows by file name.
    pub folder: PathBuf,

    /// Header of the new column; must not collide with existing headers.
    pub version_label: String,

    /// Directory the `<reportName>_<label>.xlsx` artifact is written into.
    pub output_dir: PathBuf,
}
