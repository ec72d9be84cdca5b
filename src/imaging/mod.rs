//! Image processing: decode, border-trim, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` |
//! | **Border detection** | row/column scans over an `RgbaImage` |
//! | **Crop** | `image::imageops::crop_imm` (pixel copy, no resampling) |
//! | **Encode → JPEG** | `JpegEncoder::new_with_quality` |
//!
//! The module is split into:
//! - **Trim**: Pure border-detection functions (unit testable)
//! - **Parameters**: Threshold and quality settings
//! - **Codec**: Decode/encode wrappers and [`ImagingError`]
//! - **Operations**: Per-candidate processing combining trim + codec

pub mod codec;
pub mod operations;
mod params;
pub mod trim;

pub use codec::{ImagingError, decode};
pub use operations::{ProcessedImage, process_candidate, trim_image};
pub use params::{Quality, TrimSettings};
pub use trim::CropRect;
