//! High-level image operations.
//!
//! These functions combine the pure border math in [`super::trim`] with the
//! codec. One call handles one candidate; calls for different candidates
//! share nothing and run in parallel on the pipeline's pool.

use super::codec::{ImagingError, decode_rgba, encode_jpeg};
use super::params::{Quality, TrimSettings};
use super::trim::{CropRect, crop, find_crop};
use crate::types::CandidateDescriptor;
use image::RgbaImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// A trimmed image, owned exclusively until the archive stage encodes it.
#[derive(Debug, Clone)]
pub struct ProcessedImage<'a> {
    pub candidate: &'a CandidateDescriptor,
    pub pixels: RgbaImage,
    /// Decoded dimensions before trimming.
    pub original: (u32, u32),
    pub crop: CropRect,
    pub quality: Quality,
}

impl ProcessedImage<'_> {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Whether any border was actually removed.
    pub fn was_trimmed(&self) -> bool {
        !self.crop.is_full(self.original.0, self.original.1)
    }

    /// Encode the final pixels as JPEG at the configured quality.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_jpeg(&self.pixels, self.quality)
    }
}

/// Remove blank borders from an RGBA buffer.
///
/// An image with no non-blank pixel cannot be trimmed into anything
/// meaningful and is rejected with [`ImagingError::EmptyAfterTrim`] instead
/// of yielding an empty buffer.
pub fn trim_image(img: &RgbaImage, threshold: u8) -> Result<(RgbaImage, CropRect)> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(ImagingError::Decode(format!(
            "zero-sized image ({width}x{height})"
        )));
    }
    let rect = find_crop(img, threshold).ok_or(ImagingError::EmptyAfterTrim { width, height })?;
    if rect.is_full(width, height) {
        return Ok((img.clone(), rect));
    }
    Ok((crop(img, rect), rect))
}

/// Decode a candidate's bytes and trim its borders.
pub fn process_candidate<'a>(
    candidate: &'a CandidateDescriptor,
    bytes: &[u8],
    settings: &TrimSettings,
) -> Result<ProcessedImage<'a>> {
    let decoded = decode_rgba(bytes)?;
    let original = decoded.dimensions();
    let (pixels, crop) = trim_image(&decoded, settings.threshold)?;
    if crop.is_full(original.0, original.1) {
        tracing::debug!(id = %candidate.id, "no border to trim");
    } else {
        tracing::debug!(
            id = %candidate.id,
            from = ?original,
            to = ?(crop.width(), crop.height()),
            "trimmed border"
        );
    }
    Ok(ProcessedImage {
        candidate,
        pixels,
        original,
        crop,
        quality: settings.quality,
    })
}
