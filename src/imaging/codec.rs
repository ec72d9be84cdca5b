//! Decode and encode through the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP, GIF) | `image::load_from_memory` (format sniffed from bytes) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder::new_with_quality` |

use super::params::Quality;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("image decode error: {0}")]
    Decode(String),
    #[error("image is blank after trimming ({width}x{height} source)")]
    EmptyAfterTrim { width: u32, height: u32 },
    #[error("image encode error: {0}")]
    Encode(String),
}

/// Decode any supported format and require non-zero dimensions.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, ImagingError> {
    let img = image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(ImagingError::Decode(format!(
            "zero-sized image ({}x{})",
            img.width(),
            img.height()
        )));
    }
    Ok(img)
}

/// Decode straight to an RGBA buffer.
pub fn decode_rgba(bytes: &[u8]) -> Result<RgbaImage, ImagingError> {
    decode(bytes).map(|img| img.to_rgba8())
}

/// Encode as baseline JPEG. Alpha is dropped.
pub fn encode_jpeg(img: &RgbaImage, quality: Quality) -> Result<Vec<u8>, ImagingError> {
    let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.value())
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| ImagingError::Encode(e.to_string()))?;
    Ok(out)
}
