//! Per-image acquisition pipeline.
//!
//! For every image three things are gathered before a row can be written:
//! the native dimensions, a PNG thumbnail scaled into the 200×100 layout
//! bounds, and (when enabled) the recognized text. The three run joined
//! concurrently; successive images are strictly sequential. A failed
//! recognition call degrades to a sentinel value, a failed decode skips the
//! image entirely.

use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;
use tokio::task::JoinError;

use crate::ocr::{Recognition, RecognitionClient};
use crate::source::SourceFile;

/// Layout bounds the embedded thumbnail must fit inside.
pub const THUMB_MAX_WIDTH: u32 = 200;
pub const THUMB_MAX_HEIGHT: u32 = 100;

/// Native and scaled dimensions of one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
}

impl ImageDescriptor {
    /// Scale `(width, height)` into the thumbnail bounds preserving aspect
    /// ratio: factor = min(maxW/w, maxH/h), both results floored. Small
    /// images scale up. A degenerate aspect ratio can floor one side to 0;
    /// the pixel resize clamps to 1 while the layout keeps the floored value.
    pub fn fit(width: u32, height: u32) -> Self {
        let factor = (THUMB_MAX_WIDTH as f64 / width as f64)
            .min(THUMB_MAX_HEIGHT as f64 / height as f64);
        Self {
            width,
            height,
            scaled_width: (width as f64 * factor).floor() as u32,
            scaled_height: (height as f64 * factor).floor() as u32,
        }
    }
}

/// One successfully acquired image, ready to be written as a row.
#[derive(Debug, Clone)]
pub struct IngestedImage {
    pub name: String,
    pub descriptor: ImageDescriptor,
    /// PNG-encoded thumbnail at exactly the scaled dimensions.
    pub thumbnail: Vec<u8>,
    pub recognition: Recognition,
}

/// Diagnostic record for an image that produced no row.
#[derive(Debug, Clone)]
pub struct SkippedImage {
    pub name: String,
    pub reason: String,
}

/// Decode the image and report its native dimensions.
fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("failed to decode image: {}", e))?;
    Ok((img.width(), img.height()))
}

/// Decode, scale into bounds and re-encode as PNG.
fn encode_thumbnail(bytes: &[u8]) -> Result<Vec<u8>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| format!("failed to decode image: {}", e))?;

    let descriptor = ImageDescriptor::fit(img.width(), img.height());
    let thumb = img.resize_exact(
        descriptor.scaled_width.max(1),
        descriptor.scaled_height.max(1),
        FilterType::Lanczos3,
    );

    let mut buffer = Cursor::new(Vec::new());
    thumb
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| format!("failed to encode thumbnail: {}", e))?;
    Ok(buffer.into_inner())
}

fn flatten<T>(joined: Result<Result<T, String>, JoinError>) -> Result<T, String> {
    joined.map_err(|e| format!("image worker panicked: {}", e))?
}

/// Probe dimensions and encode the thumbnail, concurrently.
///
/// This is the shared half of the pipeline: exports run it joined with the
/// recognition call, version updates run it alone (recognition is never
/// re-invoked during a merge).
pub async fn prepare_image(bytes: &[u8]) -> Result<(ImageDescriptor, Vec<u8>), String> {
    let probe_input = bytes.to_vec();
    let encode_input = bytes.to_vec();

    let (dims, thumbnail) = tokio::join!(
        tokio::task::spawn_blocking(move || probe_dimensions(&probe_input)),
        tokio::task::spawn_blocking(move || encode_thumbnail(&encode_input)),
    );

    let (width, height) = flatten(dims)?;
    let thumbnail = flatten(thumbnail)?;
    Ok((ImageDescriptor::fit(width, height), thumbnail))
}

/// Run the full acquisition pipeline for one image.
///
/// With `ocr` set, the recognition call is dispatched alongside the probe
/// and encode steps; a call that fails yields the sentinel text instead of
/// failing the image. With `ocr` unset no network request is made and the
/// row gets an empty text/translation pair.
pub async fn ingest_image(
    file: &SourceFile,
    ocr: Option<&RecognitionClient>,
) -> Result<IngestedImage, String> {
    let recognition = async {
        match ocr {
            Some(client) => match client.recognize(&file.bytes, &file.name).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("recognition failed for {}: {}", file.name, e);
                    Recognition::unavailable()
                }
            },
            None => Recognition::empty(),
        }
    };

    let (prepared, recognition) = tokio::join!(prepare_image(&file.bytes), recognition);
    let (descriptor, thumbnail) = prepared?;

    Ok(IngestedImage {
        name: file.name.clone(),
        descriptor,
        thumbnail,
        recognition,
    })
}
