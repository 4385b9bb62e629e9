//! Image processing — pure Rust, pure functions over byte buffers.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (format sniffed from magic bytes) |
//! | **Resize** | Lanczos3 via `resize_exact` |
//! | **Square crop** | `crop_imm` around the centered square |
//! | **Sharpen** | `image::imageops::unsharpen` |
//! | **Encode** | jpeg (quality), png (best/adaptive), webp (lossless) |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Parameters**: data structures describing what to do
//! - **Transform**: the bytes-in/bytes-out operation the driver calls

mod calculations;
mod params;
mod transform;

pub use calculations::{bounded_dimensions, centered_square};
pub use params::{Quality, ResizeMode, Sharpening, TransformPolicy};
pub use transform::{TransformError, TransformNote, TransformResult, transform};
