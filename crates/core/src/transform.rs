//! Image resize and re-encode pipeline
//!
//! Decodes the fetched source bytes, resizes them according to the requested
//! dimensions and fit mode, and re-encodes to WebP. The transform is a pure
//! function of its inputs, which is what makes duplicate cache population by
//! racing requests harmless: both produce byte-identical output.
//!
//! Resize semantics:
//! - both dimensions absent: no resize, decode + re-encode only
//! - one dimension given: scale to it, preserving the source aspect ratio
//!   (both fit modes behave identically)
//! - both given, cover: fill the exact box, center-cropping overflow
//! - both given, contain: largest size fitting inside the box, aspect
//!   preserved

use crate::cache::FitMode;
use crate::errors::TransformError;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::trace;

/// MIME type of every transform output
pub const OUTPUT_CONTENT_TYPE: &str = "image/webp";

/// Decode, resize, and re-encode an image to WebP
pub fn transform(
    source: &[u8],
    width: Option<u32>,
    height: Option<u32>,
    fit: FitMode,
) -> Result<Vec<u8>, TransformError> {
    let decoded = image::load_from_memory(source).map_err(TransformError::Decode)?;
    trace!(
        source_width = decoded.width(),
        source_height = decoded.height(),
        "source image decoded"
    );

    let resized = resize(decoded, width, height, fit);

    // The native WebP encoder only accepts RGB8/RGBA8; normalize other pixel
    // formats (grayscale, 16-bit) before encoding.
    let output = DynamicImage::ImageRgba8(resized.to_rgba8());

    let mut bytes = Vec::new();
    output
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::WebP)
        .map_err(TransformError::Encode)?;

    trace!(
        output_width = output.width(),
        output_height = output.height(),
        output_bytes = bytes.len(),
        "image re-encoded"
    );
    Ok(bytes)
}

fn resize(img: DynamicImage, width: Option<u32>, height: Option<u32>, fit: FitMode) -> DynamicImage {
    match (width, height) {
        (None, None) => img,
        (Some(w), None) => {
            let h = scaled_axis(w, img.height(), img.width());
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        (None, Some(h)) => {
            let w = scaled_axis(h, img.width(), img.height());
            img.resize_exact(w, h, FilterType::Lanczos3)
        }
        (Some(w), Some(h)) => match fit {
            FitMode::Cover => img.resize_to_fill(w, h, FilterType::Lanczos3),
            FitMode::Contain => img.resize(w, h, FilterType::Lanczos3),
        },
    }
}

/// Scale the free axis to preserve aspect ratio, clamped to at least 1px
fn scaled_axis(target: u32, free: u32, fixed: u32) -> u32 {
    let scaled = u64::from(target) * u64::from(free) / u64::from(fixed.max(1));
    (scaled as u32).max(1)
}
