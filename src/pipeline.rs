//! Run orchestration for the two entry points.
//!
//! One logical task per run: sheets and images are processed strictly in
//! order, with the three per-image acquisition steps joined inside
//! [`crate::ingest`]. The workbook is mutated by exactly one writer and
//! serialized once at the end.

use std::fs;
use std::path::PathBuf;

use crate::classify::{classify, ClassifiedInput};
use crate::config::{ExportConfig, UpdateConfig};
use crate::error::ReportError;
use crate::ingest::{ingest_image, SkippedImage};
use crate::ocr::RecognitionClient;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::report::{apply_version, SheetBuilder};
use crate::source::{scan_folder, SourceFile};

/// What an export run produced.
#[derive(Debug)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub report_name: String,
    pub sheets: usize,
    pub rows: usize,
    /// Images that produced no row, with the reason each was skipped.
    pub skipped: Vec<SkippedImage>,
}

/// What an update run produced.
#[derive(Debug)]
pub struct UpdateSummary {
    pub output: PathBuf,
    pub version_label: String,
    pub sheets: usize,
    pub rows_matched: usize,
    pub rows_visited: usize,
}

/// Export a folder of images into a fresh report.
///
/// Scans and classifies the folder, ingests every image bucket by bucket,
/// and writes `<folderName>.xlsx` into the output directory. Per-image
/// failures are collected in the summary; only validation, I/O and
/// serialization problems abort the run.
pub async fn run_export(
    config: &ExportConfig,
    progress: &dyn ProgressSink,
) -> Result<ExportSummary, ReportError> {
    let files = scan_folder(&config.folder)?;
    let ClassifiedInput {
        report_name,
        buckets,
    } = classify(files)?;

    let ocr = match &config.recognition {
        Some(recognition) => Some(
            RecognitionClient::new(recognition.clone()).map_err(ReportError::Recognition)?,
        ),
        None => None,
    };

    tracing::info!(
        "exporting \"{}\": {} sheet(s), recognition {}",
        report_name,
        buckets.len(),
        if ocr.is_some() { "on" } else { "off" }
    );

    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let mut rows = 0usize;
    let mut skipped = Vec::new();

    for bucket in &buckets {
        let mut builder = SheetBuilder::create(&mut book, &bucket.key)?;
        let total = bucket.files.len();

        for (i, file) in bucket.files.iter().enumerate() {
            match ingest_image(file, ocr.as_ref()).await {
                Ok(image) => {
                    builder.append(&image)?;
                    rows += 1;
                }
                Err(reason) => {
                    tracing::warn!("skipping {}: {}", file.name, reason);
                    skipped.push(SkippedImage {
                        name: file.name.clone(),
                        reason,
                    });
                }
            }
            progress.update(ProgressUpdate::new(
                i + 1,
                total,
                format!("Sheet \"{}\": image {}/{}", builder.title(), i + 1, total),
            ));
        }
        builder.finish();
    }

    let sheets = buckets.len();
    let output = artifact_path(&config.output_dir, &format!("{}.xlsx", report_name))?;
    umya_spreadsheet::writer::xlsx::write(&book, &output)
        .map_err(|e| ReportError::Spreadsheet(format!("failed to write report: {:?}", e)))?;

    tracing::info!(
        "wrote {} ({} rows, {} skipped)",
        output.display(),
        rows,
        skipped.len()
    );

    Ok(ExportSummary {
        output,
        report_name,
        sheets,
        rows,
        skipped,
    })
}

/// Append a labeled version column of replacement images to an existing
/// report and write `<reportName>_<label>.xlsx`.
pub async fn run_update(
    config: &UpdateConfig,
    progress: &dyn ProgressSink,
) -> Result<UpdateSummary, ReportError> {
    let label = config.version_label.trim();
    if label.is_empty() {
        return Err(ReportError::EmptyVersionLabel);
    }

    let replacements: Vec<SourceFile> = scan_folder(&config.folder)?
        .into_iter()
        .filter(|f| f.is_image())
        .collect();
    if replacements.is_empty() {
        return Err(ReportError::NoImages);
    }

    let mut book = umya_spreadsheet::reader::xlsx::read(&config.report).map_err(|e| {
        ReportError::Spreadsheet(format!("failed to load {}: {:?}", config.report.display(), e))
    })?;

    tracing::info!(
        "updating {} with version \"{}\" ({} replacement image(s))",
        config.report.display(),
        label,
        replacements.len()
    );

    let outcome = apply_version(&mut book, label, replacements, progress).await?;

    let base = config
        .report
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "report".to_string());
    let output = artifact_path(&config.output_dir, &format!("{}_{}.xlsx", base, label))?;
    umya_spreadsheet::writer::xlsx::write(&book, &output)
        .map_err(|e| ReportError::Spreadsheet(format!("failed to write report: {:?}", e)))?;

    tracing::info!(
        "wrote {} ({} of {} rows updated)",
        output.display(),
        outcome.rows_matched,
        outcome.rows_visited
    );

    Ok(UpdateSummary {
        output,
        version_label: label.to_string(),
        sheets: book.get_sheet_collection().len(),
        rows_matched: outcome.rows_matched,
        rows_visited: outcome.rows_visited,
    })
}

fn artifact_path(output_dir: &PathBuf, file_name: &str) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(output_dir).map_err(|e| ReportError::io(output_dir.clone(), e))?;
    Ok(output_dir.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NullProgress;
    use image::ImageFormat;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([90, 90, 30, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        fs::write(path, buffer.into_inner()).unwrap();
    }

    fn export_config(dir: &TempDir, folder: &str) -> ExportConfig {
        ExportConfig {
            folder: dir.path().join(folder),
            output_dir: dir.path().join("out"),
            recognition: None,
        }
    }

    fn sheet_by_name<'a>(
        book: &'a umya_spreadsheet::Spreadsheet,
        name: &str,
    ) -> &'a umya_spreadsheet::Worksheet {
        book.get_sheet_collection()
            .iter()
            .find(|s| s.get_name() == name)
            .unwrap()
    }

    #[tokio::test]
    async fn test_export_flat_folder_uses_root_sheet() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip")).unwrap();
        write_png(&dir.path().join("Trip/img1.png"), 40, 20);

        let summary = run_export(&export_config(&dir, "Trip"), &NullProgress)
            .await
            .unwrap();

        assert_eq!(summary.report_name, "Trip");
        assert_eq!(summary.sheets, 1);
        assert_eq!(summary.rows, 1);
        assert!(summary.skipped.is_empty());
        assert!(summary.output.ends_with("out/Trip.xlsx"));

        let book = umya_spreadsheet::reader::xlsx::read(&summary.output).unwrap();
        let sheet = sheet_by_name(&book, "RootFolder");
        assert_eq!(sheet.get_value((1, 2)), "img1.png");
        assert_eq!(sheet.get_value((3, 2)), "");
        assert_eq!(sheet.get_value((4, 2)), "");
    }

    #[tokio::test]
    async fn test_export_subfolders_become_sheets() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip/Paris")).unwrap();
        fs::create_dir_all(dir.path().join("Trip/Rome")).unwrap();
        write_png(&dir.path().join("Trip/Paris/img1.png"), 40, 20);
        write_png(&dir.path().join("Trip/Paris/img2.png"), 20, 40);
        write_png(&dir.path().join("Trip/Rome/img3.png"), 30, 30);

        let summary = run_export(&export_config(&dir, "Trip"), &NullProgress)
            .await
            .unwrap();

        assert_eq!(summary.sheets, 2);
        assert_eq!(summary.rows, 3);

        let book = umya_spreadsheet::reader::xlsx::read(&summary.output).unwrap();
        let paris = sheet_by_name(&book, "Paris");
        assert_eq!(paris.get_value((1, 2)), "img1.png");
        assert_eq!(paris.get_value((1, 3)), "img2.png");
        let rome = sheet_by_name(&book, "Rome");
        assert_eq!(rome.get_value((1, 2)), "img3.png");
    }

    #[tokio::test]
    async fn test_corrupt_image_is_skipped_and_order_kept() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip")).unwrap();
        write_png(&dir.path().join("Trip/a.png"), 40, 20);
        fs::write(dir.path().join("Trip/b.png"), b"not a png").unwrap();
        write_png(&dir.path().join("Trip/c.png"), 40, 20);

        let summary = run_export(&export_config(&dir, "Trip"), &NullProgress)
            .await
            .unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "b.png");

        let book = umya_spreadsheet::reader::xlsx::read(&summary.output).unwrap();
        let sheet = sheet_by_name(&book, "RootFolder");
        assert_eq!(sheet.get_value((1, 2)), "a.png");
        assert_eq!(sheet.get_value((1, 3)), "c.png");
    }

    #[tokio::test]
    async fn test_export_without_images_fails_validation() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip")).unwrap();
        fs::write(dir.path().join("Trip/notes.txt"), b"text").unwrap();

        let result = run_export(&export_config(&dir, "Trip"), &NullProgress).await;
        assert!(matches!(result, Err(ReportError::NoImages)));
    }

    #[tokio::test]
    async fn test_update_appends_version_column() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip")).unwrap();
        write_png(&dir.path().join("Trip/img1.png"), 40, 20);

        let exported = run_export(&export_config(&dir, "Trip"), &NullProgress)
            .await
            .unwrap();

        fs::create_dir_all(dir.path().join("New")).unwrap();
        write_png(&dir.path().join("New/img1.png"), 30, 10);

        let update = UpdateConfig {
            report: exported.output.clone(),
            folder: dir.path().join("New"),
            version_label: "V2".to_string(),
            output_dir: dir.path().join("out"),
        };
        let summary = run_update(&update, &NullProgress).await.unwrap();

        assert_eq!(summary.rows_matched, 1);
        assert!(summary.output.ends_with("out/Trip_V2.xlsx"));

        let book = umya_spreadsheet::reader::xlsx::read(&summary.output).unwrap();
        let sheet = sheet_by_name(&book, "RootFolder");
        assert_eq!(sheet.get_value((5, 1)), "V2");
    }

    #[tokio::test]
    async fn test_update_rejects_duplicate_label() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Trip")).unwrap();
        write_png(&dir.path().join("Trip/img1.png"), 40, 20);

        let exported = run_export(&export_config(&dir, "Trip"), &NullProgress)
            .await
            .unwrap();

        fs::create_dir_all(dir.path().join("New")).unwrap();
        write_png(&dir.path().join("New/img1.png"), 30, 10);

        let update = UpdateConfig {
            report: exported.output.clone(),
            folder: dir.path().join("New"),
            version_label: "V2".to_string(),
            output_dir: dir.path().join("out"),
        };
        let first = run_update(&update, &NullProgress).await.unwrap();

        // Re-running against the updated artifact with the same label must
        // be rejected before any mutation, and write nothing.
        let again = UpdateConfig {
            report: first.output.clone(),
            ..update
        };
        let result = run_update(&again, &NullProgress).await;
        assert!(matches!(result, Err(ReportError::DuplicateVersionLabel(_))));
        assert!(!dir.path().join("out/Trip_V2_V2.xlsx").exists());
    }

    #[tokio::test]
    async fn test_update_rejects_blank_label() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("New")).unwrap();
        write_png(&dir.path().join("New/img1.png"), 30, 10);

        let update = UpdateConfig {
            report: dir.path().join("missing.xlsx"),
            folder: dir.path().join("New"),
            version_label: "   ".to_string(),
            output_dir: dir.path().join("out"),
        };
        let result = run_update(&update, &NullProgress).await;
        assert!(matches!(result, Err(ReportError::EmptyVersionLabel)));
    }
}
