//! Sheet construction for a fresh export.
//!
//! One builder per bucket: writes the fixed header row, appends one row per
//! ingested image with its one-cell-anchored thumbnail, and sizes the image
//! column from the widest thumbnail once the sheet is complete.

use std::io::Write;

use umya_spreadsheet::structs::drawing::spreadsheet::MarkerType;
use umya_spreadsheet::structs::Image;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use super::{
    cell_ref, column_letter, sheet_title, COL_IMAGE, COL_NAME, COL_TEXT, COL_TRANSLATION,
    FIXED_COLUMNS, IMAGE_WIDTH_DIVISOR, ROW_HEIGHT_PADDING,
};
use crate::error::ReportError;
use crate::ingest::{ImageDescriptor, IngestedImage};

/// Incrementally fills one worksheet.
pub struct SheetBuilder<'a> {
    sheet: &'a mut Worksheet,
    title: String,
    next_row: u32,
    max_scaled_width: u32,
}

impl<'a> SheetBuilder<'a> {
    /// Add a worksheet for `bucket_key` to the workbook and write its header
    /// row. The key is truncated to the 31-char title limit; a duplicate
    /// title (possible after truncation) is a spreadsheet error.
    pub fn create(book: &'a mut Spreadsheet, bucket_key: &str) -> Result<Self, ReportError> {
        let title = sheet_title(bucket_key);
        let sheet = book
            .new_sheet(title.as_str())
            .map_err(|e| ReportError::Spreadsheet(format!("cannot add sheet \"{}\": {}", title, e)))?;

        for (i, (caption, width)) in FIXED_COLUMNS.iter().enumerate() {
            let col = i as u32 + 1;
            sheet.get_cell_mut((col, 1)).set_value(*caption);
            sheet
                .get_column_dimension_mut(&column_letter(col))
                .set_width(*width);
        }

        Ok(Self {
            sheet,
            title,
            next_row: 2,
            max_scaled_width: 0,
        })
    }

    /// Sheet title after truncation.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Rows appended so far.
    pub fn rows_written(&self) -> usize {
        (self.next_row - 2) as usize
    }

    /// Append one row: name, recognized text, translation, thumbnail.
    pub fn append(&mut self, image: &IngestedImage) -> Result<(), ReportError> {
        let row = self.next_row;

        self.sheet
            .get_cell_mut((COL_NAME, row))
            .set_value(image.name.as_str());
        self.sheet
            .get_cell_mut((COL_TEXT, row))
            .set_value(image.recognition.text.as_str());
        self.sheet
            .get_cell_mut((COL_TRANSLATION, row))
            .set_value(image.recognition.translation.as_str());

        embed_thumbnail(self.sheet, COL_IMAGE, row, &image.descriptor, &image.thumbnail)?;

        if image.descriptor.scaled_width > self.max_scaled_width {
            self.max_scaled_width = image.descriptor.scaled_width;
        }
        self.next_row += 1;
        Ok(())
    }

    /// Finalize the sheet: size the image column from the widest thumbnail.
    pub fn finish(self) {
        self.sheet
            .get_column_dimension_mut(&column_letter(COL_IMAGE))
            .set_width(self.max_scaled_width as f64 / IMAGE_WIDTH_DIVISOR);
    }
}

/// Embed a PNG thumbnail anchored at `(col, row)` and set the row height to
/// the scaled image height plus padding.
///
/// The container library reads image payloads from a path, so the bytes are
/// staged in a temp file that lives until the anchor has been added.
pub(crate) fn embed_thumbnail(
    sheet: &mut Worksheet,
    col: u32,
    row: u32,
    descriptor: &ImageDescriptor,
    png: &[u8],
) -> Result<(), ReportError> {
    sheet
        .get_row_dimension_mut(&row)
        .set_height((descriptor.scaled_height + ROW_HEIGHT_PADDING) as f64);

    let mut staged = tempfile::Builder::new()
        .prefix("photoreport-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| ReportError::Spreadsheet(format!("cannot stage thumbnail: {}", e)))?;
    staged
        .write_all(png)
        .and_then(|_| staged.flush())
        .map_err(|e| ReportError::Spreadsheet(format!("cannot stage thumbnail: {}", e)))?;

    let path = staged
        .path()
        .to_str()
        .ok_or_else(|| ReportError::Spreadsheet("thumbnail staging path is not UTF-8".into()))?;

    let mut marker = MarkerType::default();
    marker.set_coordinate(cell_ref(col, row).as_str());

    let mut anchor = Image::default();
    anchor.new_image(path, marker);
    sheet.add_image(anchor);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Recognition;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([200, 40, 40, 255]),
        ));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    fn ingested(name: &str, width: u32, height: u32, text: &str) -> IngestedImage {
        IngestedImage {
            name: name.to_string(),
            descriptor: ImageDescriptor::fit(width, height),
            thumbnail: png_bytes(width, height),
            recognition: Recognition {
                text: text.to_string(),
                translation: String::new(),
            },
        }
    }

    #[test]
    fn test_builder_writes_header_and_rows() {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let mut builder = SheetBuilder::create(&mut book, "Paris").unwrap();

        builder.append(&ingested("a.png", 40, 20, "menu")).unwrap();
        builder.append(&ingested("b.png", 20, 40, "")).unwrap();
        assert_eq!(builder.rows_written(), 2);
        builder.finish();

        let sheet = book
            .get_sheet_collection()
            .iter()
            .find(|s| s.get_name() == "Paris")
            .unwrap();
        assert_eq!(sheet.get_value((1, 1)), "Image Name");
        assert_eq!(sheet.get_value((4, 1)), "Translation");
        assert_eq!(sheet.get_value((1, 2)), "a.png");
        assert_eq!(sheet.get_value((3, 2)), "menu");
        assert_eq!(sheet.get_value((1, 3)), "b.png");
    }

    #[test]
    fn test_long_bucket_key_truncates_sheet_title() {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let key = "Very/Long/Nested/Path/That/Does/Not/Fit";
        let builder = SheetBuilder::create(&mut book, key).unwrap();

        assert_eq!(builder.title().chars().count(), 31);
        assert!(key.starts_with(builder.title()));
    }
}
