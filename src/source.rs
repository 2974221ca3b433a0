//! Source file model and folder scanner.
//!
//! The scanner recreates the shape a browser folder upload would deliver:
//! every file carries a relative path whose first segment is the selected
//! folder's own name. Classification and row matching downstream key off
//! those segments, never off absolute paths.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::ReportError;

/// One input file, fully loaded into memory for the duration of a run.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// File name including extension, e.g. `img1.jpg`.
    pub name: String,

    /// Relative path segments starting with the top-level folder name,
    /// ending with the file name.
    pub segments: Vec<String>,

    /// Declared media type, e.g. `image/jpeg`; empty when unknown.
    pub media_type: String,

    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

impl SourceFile {
    /// Whether the declared media type marks this file as an image.
    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Path segments between the top-level folder and the file name.
    pub fn intermediate_segments(&self) -> &[String] {
        if self.segments.len() > 2 {
            &self.segments[1..self.segments.len() - 1]
        } else {
            &[]
        }
    }
}

/// Walk `folder` and load every regular file beneath it.
///
/// Entries are sorted by path so bucket and row order is stable across
/// platforms and filesystems. Files that cannot be read are logged and left
/// out rather than failing the run; an unreadable or missing root folder is
/// an error.
pub fn scan_folder(folder: &Path) -> Result<Vec<SourceFile>, ReportError> {
    if !folder.is_dir() {
        return Err(ReportError::io(
            folder,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "RootFolder".to_string());

    let mut files = Vec::new();
    for entry in WalkDir::new(folder)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();

        let relative = match path.strip_prefix(folder) {
            Ok(r) => r,
            Err(_) => continue,
        };
        let mut segments = vec![folder_name.clone()];
        segments.extend(
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string()),
        );

        let name = match segments.last() {
            Some(n) => n.clone(),
            None => continue,
        };
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_default();

        match fs::read(path) {
            Ok(bytes) => files.push(SourceFile {
                name,
                segments,
                media_type,
                bytes,
            }),
            Err(e) => {
                tracing::warn!("skipping unreadable file {}: {}", path.display(), e);
            }
        }
    }

    Ok(files)
}
