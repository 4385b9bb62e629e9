//! The transform stage: bytes in, bytes out.
//!
//! Decodes a downloaded asset, brings it within the policy's resolution
//! bounds, and re-encodes it for its target format. The operation is a pure
//! function over byte buffers and **never fails**: anything that goes wrong
//! inside the image library recovers to the original bytes, because a
//! degraded-but-valid asset is preferred over a failed pipeline item. The
//! [`TransformNote`] on the result makes those recoveries observable instead
//! of silent.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP) | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Square crop | `DynamicImage::crop_imm` |
//! | Sharpening | `image::imageops::unsharpen` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG | `PngEncoder` (best compression, adaptive filtering) |
//! | Encode → WebP | `WebPEncoder::new_lossless` |

use super::calculations::{bounded_dimensions, centered_square};
use super::params::{ResizeMode, TransformPolicy};
use crate::classify::ImageKind;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// What the transform actually did to the bytes.
#[derive(Debug)]
pub enum TransformNote {
    /// Decoded, brought within bounds, re-encoded.
    Resized { from: (u32, u32), to: (u32, u32) },
    /// Dimensions already within bounds; bytes returned untouched.
    WithinBounds,
    /// Format is never re-encoded (gif keeps its animation).
    FormatPassthrough,
    /// Processing failed; original bytes returned untouched.
    Recovered(TransformError),
}

/// Output bytes plus a record of what happened to them.
#[derive(Debug)]
pub struct TransformResult {
    pub bytes: Vec<u8>,
    pub note: TransformNote,
}

/// Conditionally resize and re-encode an asset under `policy`.
///
/// `kind` is the target format the result will be stored as; the decoder
/// sniffs the actual input format from the bytes, so a mislabeled asset
/// still decodes.
pub fn transform(bytes: &[u8], kind: ImageKind, policy: &TransformPolicy) -> TransformResult {
    if !kind.re_encodable() {
        return TransformResult {
            bytes: bytes.to_vec(),
            note: TransformNote::FormatPassthrough,
        };
    }

    match reencode(bytes, kind, policy) {
        Ok(Some((out, from, to))) => TransformResult {
            bytes: out,
            note: TransformNote::Resized { from, to },
        },
        Ok(None) => TransformResult {
            bytes: bytes.to_vec(),
            note: TransformNote::WithinBounds,
        },
        Err(e) => TransformResult {
            bytes: bytes.to_vec(),
            note: TransformNote::Recovered(e),
        },
    }
}

/// The fallible inner pipeline. `Ok(None)` means the image fits its bounds
/// and no work was done.
fn reencode(
    bytes: &[u8],
    kind: ImageKind,
    policy: &TransformPolicy,
) -> Result<Option<(Vec<u8>, (u32, u32), (u32, u32))>, TransformError> {
    let img = image::load_from_memory(bytes).map_err(|e| TransformError::Decode(e.to_string()))?;
    let from = (img.width(), img.height());

    if from.0 <= policy.max_width && from.1 <= policy.max_height {
        return Ok(None);
    }

    // Color-mode normalization precedes all geometry work
    let img = normalize_color(img, kind);

    let img = match policy.mode {
        ResizeMode::Bound => img,
        ResizeMode::CropSquare => {
            let (x, y, side) = centered_square(img.width(), img.height());
            img.crop_imm(x, y, side, side)
        }
    };

    let img = match bounded_dimensions(
        (img.width(), img.height()),
        (policy.max_width, policy.max_height),
    ) {
        Some((w, h)) => img.resize_exact(w, h, FilterType::Lanczos3),
        None => img,
    };

    let img = match policy.sharpen {
        Some(s) => sharpen(img, s.sigma, s.threshold),
        None => img,
    };

    let to = (img.width(), img.height());
    let out = encode(&img, kind, policy.quality.value())?;
    Ok(Some((out, from, to)))
}

/// Flatten the image for its target format.
///
/// JPEG has no alpha channel: transparent sources are composited onto a
/// white background, everything else becomes plain RGB. PNG/WebP keep their
/// alpha when present (palette sources were already promoted by the decoder).
fn normalize_color(img: DynamicImage, kind: ImageKind) -> DynamicImage {
    let has_alpha = img.color().has_alpha();
    match kind {
        ImageKind::Jpg if has_alpha => DynamicImage::ImageRgb8(composite_on_white(&img.to_rgba8())),
        ImageKind::Jpg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ if has_alpha => DynamicImage::ImageRgba8(img.to_rgba8()),
        _ => DynamicImage::ImageRgb8(img.to_rgb8()),
    }
}

fn composite_on_white(rgba: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let a = px[3] as u32;
        let blend = |c: u8| -> u8 { ((c as u32 * a + 255 * (255 - a)) / 255) as u8 };
        out.put_pixel(x, y, image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

/// Unsharp mask on whichever buffer variant survived normalization.
fn sharpen(img: DynamicImage, sigma: f32, threshold: i32) -> DynamicImage {
    match img {
        DynamicImage::ImageRgb8(buf) => {
            DynamicImage::ImageRgb8(image::imageops::unsharpen(&buf, sigma, threshold))
        }
        DynamicImage::ImageRgba8(buf) => {
            DynamicImage::ImageRgba8(image::imageops::unsharpen(&buf, sigma, threshold))
        }
        other => other,
    }
}

fn encode(img: &DynamicImage, kind: ImageKind, quality: u32) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::new();
    let mut cursor = Cursor::new(&mut out);

    let result = match kind {
        ImageKind::Jpg => {
            img.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, quality as u8))
        }
        ImageKind::Png => img.write_with_encoder(PngEncoder::new_with_quality(
            &mut cursor,
            CompressionType::Best,
            PngFilter::Adaptive,
        )),
        ImageKind::Webp => img.write_with_encoder(WebPEncoder::new_lossless(&mut cursor)),
        // Guarded by re_encodable() before decode
        ImageKind::Gif => {
            return Err(TransformError::Encode("gif is never re-encoded".to_string()));
        }
    };

    result.map_err(|e| TransformError::Encode(e.to_string()))?;
    Ok(out)
}
