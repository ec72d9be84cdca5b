//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`TrimSettings`]: Blank threshold plus output quality for border trimming.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Border-trim parameters.
///
/// - `threshold`: a pixel is blank when its R, G and B channels are all
///   `<= threshold` (0–255 scale). Alpha is ignored.
/// - `quality`: JPEG quality used to re-encode the trimmed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimSettings {
    pub threshold: u8,
    pub quality: Quality,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            threshold: 30,
            quality: Quality::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn trim_settings_defaults() {
        let s = TrimSettings::default();
        assert_eq!(s.threshold, 30);
        assert_eq!(s.quality.value(), 95);
    }
}
