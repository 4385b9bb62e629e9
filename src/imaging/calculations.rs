//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the dimensions an oversized image scales down to.
///
/// Returns `None` when the image already fits within `bounds` (no resize
/// needed). Otherwise applies a single uniform scale factor — the minimum of
/// the per-axis ratios — so aspect ratio is preserved and both dimensions
/// land within bounds. Fractional pixels truncate.
///
/// # Examples
/// ```
/// # use pixhaul::imaging::bounded_dimensions;
/// assert_eq!(bounded_dimensions((3000, 2000), (2600, 2600)), Some((2600, 1733)));
/// assert_eq!(bounded_dimensions((800, 600), (2600, 2600)), None);
/// ```
pub fn bounded_dimensions(original: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let (w, h) = original;
    let (max_w, max_h) = bounds;

    if w <= max_w && h <= max_h {
        return None;
    }

    let ratio = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    Some(((w as f64 * ratio) as u32, (h as f64 * ratio) as u32))
}

/// Calculate the centered square crop region for an image.
///
/// Returns `(x, y, side)` where `side = min(w, h)` and the offsets center
/// the square on the longer axis.
pub fn centered_square(w: u32, h: u32) -> (u32, u32, u32) {
    let side = w.min(h);
    ((w - side) / 2, (h - side) / 2, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // bounded_dimensions tests
    // =========================================================================

    #[test]
    fn within_bounds_needs_no_resize() {
        assert_eq!(bounded_dimensions((2600, 2600), (2600, 2600)), None);
        assert_eq!(bounded_dimensions((100, 100), (2600, 2600)), None);
    }

    #[test]
    fn landscape_scales_to_width_bound() {
        // 3000x2000 under 2600x2600: ratio 2600/3000, height truncates to 1733
        assert_eq!(bounded_dimensions((3000, 2000), (2600, 2600)), Some((2600, 1733)));
    }

    #[test]
    fn portrait_scales_to_height_bound() {
        assert_eq!(bounded_dimensions((2000, 3000), (2600, 2600)), Some((1733, 2600)));
    }

    #[test]
    fn one_axis_over_still_scales_both() {
        // Width fits but height doesn't: the height ratio governs
        assert_eq!(bounded_dimensions((1000, 3200), (2600, 1600)), Some((500, 1600)));
    }

    #[test]
    fn asymmetric_bounds_use_minimum_ratio() {
        // 4000x1000 into 1600x1600: width ratio 0.4 wins
        assert_eq!(bounded_dimensions((4000, 1000), (1600, 1600)), Some((1600, 400)));
    }

    #[test]
    fn exact_halving() {
        assert_eq!(bounded_dimensions((5200, 3200), (2600, 1600)), Some((2600, 1600)));
    }

    // =========================================================================
    // centered_square tests
    // =========================================================================

    #[test]
    fn square_input_is_untouched() {
        assert_eq!(centered_square(400, 400), (0, 0, 400));
    }

    #[test]
    fn landscape_crops_horizontally() {
        assert_eq!(centered_square(800, 600), (100, 0, 600));
    }

    #[test]
    fn portrait_crops_vertically() {
        assert_eq!(centered_square(600, 800), (0, 100, 600));
    }

    #[test]
    fn odd_margin_rounds_down() {
        // 801 wide: margin 201/2 = 100 (integer division)
        assert_eq!(centered_square(801, 600), (100, 0, 600));
    }
}
