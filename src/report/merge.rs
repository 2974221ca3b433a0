//! Version merge: extend an existing report with a new image column.
//!
//! The duplicate-label check runs strictly before any mutation, so a
//! rejected merge leaves the loaded workbook exactly as it was read. Column
//! allocation happens for every sheet up front; rows are then matched by
//! exact file name and the replacement thumbnails embedded one row at a
//! time, sequentially.

use std::collections::HashMap;

use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::builder::embed_thumbnail;
use super::{column_letter, COL_NAME, VERSION_COLUMN_WIDTH};
use crate::classify::ROOT_BUCKET;
use crate::error::ReportError;
use crate::ingest;
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::source::SourceFile;

/// Counters reported back to the shell after a merge.
#[derive(Debug, Default, Clone, Copy)]
pub struct MergeOutcome {
    /// Rows that received a replacement image.
    pub rows_matched: usize,

    /// Data rows visited across all sheets.
    pub rows_visited: usize,
}

/// Values of the populated header cells of a sheet, in column order.
pub fn header_labels(sheet: &Worksheet) -> Vec<String> {
    let mut labels = Vec::new();
    for col in 1..=sheet.get_highest_column() {
        let value = sheet.get_value((col, 1));
        if !value.is_empty() {
            labels.push(value);
        }
    }
    labels
}

/// Highest populated column index in the header row, 0 when the row is empty.
fn highest_header_column(sheet: &Worksheet) -> u32 {
    let mut last = 0;
    for col in 1..=sheet.get_highest_column() {
        if !sheet.get_value((col, 1)).is_empty() {
            last = col;
        }
    }
    last
}

/// Index allocated for the version column given the highest used header
/// column: `max(5, highest + 1)`, so the column never lands inside the four
/// fixed columns even on a sparse sheet.
pub fn version_column_index(highest_used: u32) -> u32 {
    (highest_used + 1).max(5)
}

/// Reject `label` if it already appears verbatim among the first sheet's
/// headers. Exact string equality, case-sensitive.
pub fn ensure_unique_label(book: &Spreadsheet, label: &str) -> Result<(), ReportError> {
    if let Some(first) = book.get_sheet_collection().first() {
        if header_labels(first).iter().any(|h| h == label) {
            return Err(ReportError::DuplicateVersionLabel(label.to_string()));
        }
    }
    Ok(())
}

/// Group replacement files by their second path segment, falling back to the
/// root sentinel when a file sits directly under the selected folder.
pub fn partition_replacements(files: Vec<SourceFile>) -> HashMap<String, Vec<SourceFile>> {
    let mut by_folder: HashMap<String, Vec<SourceFile>> = HashMap::new();
    for file in files {
        if !file.is_image() {
            continue;
        }
        let key = file
            .segments
            .get(1)
            .filter(|_| file.segments.len() > 2)
            .cloned()
            .unwrap_or_else(|| ROOT_BUCKET.to_string());
        by_folder.entry(key).or_default().push(file);
    }
    by_folder
}

/// Append a version column labeled `label` to every sheet and embed the
/// matching replacement images.
///
/// Sheets pick the replacement subset whose key equals their name, falling
/// back to the shared root-sentinel pool; the pool is not consumed, so one
/// fallback file can serve several sheets. A replacement that fails to
/// decode skips its row and the merge continues.
pub async fn apply_version(
    book: &mut Spreadsheet,
    label: &str,
    replacements: Vec<SourceFile>,
    progress: &dyn ProgressSink,
) -> Result<MergeOutcome, ReportError> {
    ensure_unique_label(book, label)?;

    let by_folder = partition_replacements(replacements);

    // Allocate the new column on every sheet before touching any row.
    let sheet_count = book.get_sheet_collection().len();
    let mut columns = Vec::with_capacity(sheet_count);
    for i in 0..sheet_count {
        let sheet = &mut book.get_sheet_collection_mut()[i];
        let col = version_column_index(highest_header_column(sheet));
        sheet.get_cell_mut((col, 1)).set_value(label);
        sheet
            .get_column_dimension_mut(&column_letter(col))
            .set_width(VERSION_COLUMN_WIDTH);
        columns.push(col);
    }

    let mut outcome = MergeOutcome::default();
    for (i, &version_col) in columns.iter().enumerate() {
        let sheet = &mut book.get_sheet_collection_mut()[i];
        let sheet_name = sheet.get_name().to_string();
        let highest_row = sheet.get_highest_row();

        let pool = by_folder
            .get(&sheet_name)
            .or_else(|| by_folder.get(ROOT_BUCKET));
        let by_name: HashMap<&str, &SourceFile> = pool
            .map(|files| files.iter().map(|f| (f.name.as_str(), f)).collect())
            .unwrap_or_default();

        let total = highest_row.saturating_sub(1) as usize;
        let mut visited = 0usize;

        for row in 2..=highest_row {
            let name = sheet.get_value((COL_NAME, row));
            if let Some(file) = by_name.get(name.as_str()) {
                match ingest::prepare_image(&file.bytes).await {
                    Ok((descriptor, thumbnail)) => {
                        embed_thumbnail(sheet, version_col, row, &descriptor, &thumbnail)?;
                        outcome.rows_matched += 1;
                    }
                    Err(reason) => {
                        tracing::warn!(
                            "skipping replacement {} on sheet \"{}\": {}",
                            name,
                            sheet_name,
                            reason
                        );
                    }
                }
            }

            visited += 1;
            outcome.rows_visited += 1;
            progress.update(ProgressUpdate::new(
                visited,
                total,
                format!("Sheet \"{}\": row {}/{}", sheet_name, visited, total),
            ));
        }
    }

    Ok(outcome)
}
