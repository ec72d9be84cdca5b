//! Pure border-detection math.
//!
//! All functions here work on an in-memory RGBA buffer and are testable
//! without any codec or I/O.
//!
//! ## Algorithm
//!
//! ```text
//! 1. top    = consecutive blank rows from the top
//! 2. bottom = H - consecutive blank rows from the bottom   (exclusive)
//! 3. left   = consecutive blank columns from the left,  tested on rows [top, bottom)
//!    right  = W - consecutive blank columns from the right (exclusive)
//! 4. output = [left, right) × [top, bottom), copied pixel-for-pixel
//! ```
//!
//! Each row/column test exits at the first non-blank pixel. The column scans
//! only look at the row band that survived steps 1–2.
//!
//! An all-blank image has no content rectangle: step 1 consumes every row.
//! [`find_crop`] reports that as `None` rather than an empty rectangle.

use image::{Rgba, RgbaImage};
use serde::Serialize;

/// Half-open content rectangle `[left, right) × [top, bottom)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    /// True when the rectangle covers the whole `width × height` image.
    pub fn is_full(&self, width: u32, height: u32) -> bool {
        self.left == 0 && self.top == 0 && self.right == width && self.bottom == height
    }
}

#[inline]
fn is_blank(px: &Rgba<u8>, threshold: u8) -> bool {
    px[0] <= threshold && px[1] <= threshold && px[2] <= threshold
}

fn row_is_blank(img: &RgbaImage, y: u32, threshold: u8) -> bool {
    (0..img.width()).all(|x| is_blank(img.get_pixel(x, y), threshold))
}

fn column_is_blank(img: &RgbaImage, x: u32, rows: (u32, u32), threshold: u8) -> bool {
    (rows.0..rows.1).all(|y| is_blank(img.get_pixel(x, y), threshold))
}

/// Locate the content rectangle inside uniform dark borders.
///
/// Returns `None` when the image is zero-sized or every pixel is blank.
pub fn find_crop(img: &RgbaImage, threshold: u8) -> Option<CropRect> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let top = (0..height)
        .take_while(|&y| row_is_blank(img, y, threshold))
        .count() as u32;
    if top == height {
        return None;
    }
    let bottom = height
        - (top..height)
            .rev()
            .take_while(|&y| row_is_blank(img, y, threshold))
            .count() as u32;

    // Row `top` holds a non-blank pixel, so at least one column survives.
    let rows = (top, bottom);
    let left = (0..width)
        .take_while(|&x| column_is_blank(img, x, rows, threshold))
        .count() as u32;
    let right = width
        - (left..width)
            .rev()
            .take_while(|&x| column_is_blank(img, x, rows, threshold))
            .count() as u32;

    Some(CropRect {
        left,
        top,
        right,
        bottom,
    })
}

/// Copy the rectangle out into a new buffer (no resampling).
pub fn crop(img: &RgbaImage, rect: CropRect) -> RgbaImage {
    image::imageops::crop_imm(img, rect.left, rect.top, rect.width(), rect.height()).to_image()
}
