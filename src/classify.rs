//! Folder classification.
//!
//! Partitions a flat file list into named sheet buckets using the relative
//! path structure: the segments between the top-level folder and the file
//! name become the bucket key. Files without subfolder structure land in the
//! `RootFolder` sentinel bucket.

use std::collections::HashMap;

use crate::error::ReportError;
use crate::source::SourceFile;

/// Bucket key used when a file sits directly under the top-level folder.
pub const ROOT_BUCKET: &str = "RootFolder";

/// A named group of images destined for one worksheet.
#[derive(Debug)]
pub struct SheetBucket {
    /// Bucket key; becomes the sheet title (truncated by the builder).
    pub key: String,

    /// Files in input order; row order within the sheet follows it.
    pub files: Vec<SourceFile>,
}

/// Result of classifying one input set.
#[derive(Debug)]
pub struct ClassifiedInput {
    /// Report name, taken from the top-level segment of the first file.
    pub report_name: String,

    /// Buckets in discovery order.
    pub buckets: Vec<SheetBucket>,
}

/// Derive the bucket key for one file.
fn bucket_key(file: &SourceFile) -> String {
    let middle = file.intermediate_segments();
    if middle.is_empty() {
        ROOT_BUCKET.to_string()
    } else {
        middle.join("/")
    }
}

/// Partition `files` into sheet buckets, dropping everything that does not
/// declare an `image/*` media type.
///
/// Bucket discovery order and per-bucket file order both follow the input
/// order. Fails with [`ReportError::NoImages`] when nothing survives the
/// filter.
pub fn classify(files: Vec<SourceFile>) -> Result<ClassifiedInput, ReportError> {
    let report_name = files
        .first()
        .and_then(|f| f.segments.first().cloned())
        .unwrap_or_default();

    let mut buckets: Vec<SheetBucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for file in files {
        if !file.is_image() {
            continue;
        }
        let key = bucket_key(&file);
        match index.get(&key) {
            Some(&i) => buckets[i].files.push(file),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(SheetBucket {
                    key,
                    files: vec![file],
                });
            }
        }
    }

    if buckets.is_empty() {
        return Err(ReportError::NoImages);
    }

    Ok(ClassifiedInput {
        report_name,
        buckets,
    })
}
