//! Parameter types for the transform stage.
//!
//! These structs describe *what* to do to an image, not *how* — the policy
//! travels from CLI flags through the driver down to [`transform`]
//! (super::transform::transform) unchanged, so every pipeline variant
//! (full migration, local resize pass, thumbnail pass) is just a different
//! policy value.
//!
//! ## Types
//!
//! - [`Quality`] — lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Sharpening`] — unsharp-mask parameters (sigma + threshold) applied post-resize.
//! - [`ResizeMode`] — bound within a box preserving aspect, or center-crop to square first.
//! - [`TransformPolicy`] — the full specification: bounds, mode, sharpening, quality.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening to recover crispness lost in downscaling.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// How an oversized image is brought within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Single uniform scale preserving aspect ratio.
    Bound,
    /// Center-crop to a square of side `min(w, h)` before scaling.
    CropSquare,
}

/// Full specification for the transform stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformPolicy {
    pub max_width: u32,
    pub max_height: u32,
    pub mode: ResizeMode,
    pub sharpen: Option<Sharpening>,
    pub quality: Quality,
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
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    #[test]
    fn sharpening_light_values() {
        let s = Sharpening::light();
        assert_eq!(s.sigma, 0.5);
        assert_eq!(s.threshold, 0);
    }
}
