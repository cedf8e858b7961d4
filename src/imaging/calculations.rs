//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Output size of a `(width, height)` rectangle scaled by `scale`.
///
/// Each side is rounded to the nearest pixel and never drops below 1, so a
/// valid crop always produces a non-empty image. Sides too large for `u32`
/// saturate; callers that accept untrusted scales use
/// [`checked_scaled_dimensions`] first.
///
/// # Examples
/// ```
/// # use iiif_serve::imaging::scaled_dimensions;
/// assert_eq!(scaled_dimensions((400, 300), 0.5), (200, 150));
/// assert_eq!(scaled_dimensions((1000, 1), 0.001), (1, 1));
/// ```
pub fn scaled_dimensions(size: (u32, u32), scale: f64) -> (u32, u32) {
    let (w, h) = size;
    (scaled_side(w, scale) as u32, scaled_side(h, scale) as u32)
}

/// Like [`scaled_dimensions`], but `None` when either side overflows `u32`.
pub fn checked_scaled_dimensions(size: (u32, u32), scale: f64) -> Option<(u32, u32)> {
    let (w, h) = size;
    let fits = |v: f64| v.is_finite() && v <= u32::MAX as f64;
    let (sw, sh) = (scaled_side(w, scale), scaled_side(h, scale));
    (fits(sw) && fits(sh)).then(|| (sw as u32, sh as u32))
}

fn scaled_side(v: u32, scale: f64) -> f64 {
    (v as f64 * scale).round().max(1.0)
}

/// Number of clockwise quarter turns for a rotation, if it is a multiple of 90°.
///
/// Returns `None` for any other angle.
pub fn quarter_turns(degrees: f64) -> Option<u8> {
    if !degrees.is_finite() || degrees < 0.0 || degrees % 90.0 != 0.0 {
        return None;
    }
    Some(((degrees / 90.0) as u32 % 4) as u8)
}

/// Dimensions after rotating by `turns` quarter turns.
pub fn rotated_dimensions(size: (u32, u32), turns: u8) -> (u32, u32) {
    let (w, h) = size;
    if turns % 2 == 1 { (h, w) } else { (w, h) }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // scaled_dimensions tests
    // =========================================================================

    #[test]
    fn scaled_identity() {
        assert_eq!(scaled_dimensions((1000, 800), 1.0), (1000, 800));
    }

    #[test]
    fn scaled_half() {
        assert_eq!(scaled_dimensions((900, 700), 0.5), (450, 350));
    }

    #[test]
    fn scaled_rounds_to_nearest() {
        // 333 * 0.5 = 166.5 → 167
        assert_eq!(scaled_dimensions((333, 100), 0.5), (167, 50));
    }

    #[test]
    fn scaled_never_below_one_pixel() {
        assert_eq!(scaled_dimensions((1000, 2), 0.001), (1, 1));
    }

    #[test]
    fn scaled_up() {
        assert_eq!(scaled_dimensions((100, 50), 3.0), (300, 150));
    }

    #[test]
    fn checked_matches_unchecked_in_range() {
        assert_eq!(
            checked_scaled_dimensions((333, 100), 0.5),
            Some(scaled_dimensions((333, 100), 0.5))
        );
        assert_eq!(checked_scaled_dimensions((1000, 2), 0.001), Some((1, 1)));
    }

    #[test]
    fn checked_rejects_u32_overflow() {
        // 1000 * 4_300_000 = 4.3e9 > u32::MAX
        assert_eq!(checked_scaled_dimensions((1000, 800), 4_300_000.0), None);
        assert_eq!(checked_scaled_dimensions((1, 1), f64::INFINITY), None);
        assert_eq!(
            checked_scaled_dimensions((1, 1), u32::MAX as f64),
            Some((u32::MAX, u32::MAX))
        );
    }

    // =========================================================================
    // quarter_turns tests
    // =========================================================================

    #[test]
    fn quarter_turns_for_right_angles() {
        assert_eq!(quarter_turns(0.0), Some(0));
        assert_eq!(quarter_turns(90.0), Some(1));
        assert_eq!(quarter_turns(180.0), Some(2));
        assert_eq!(quarter_turns(270.0), Some(3));
    }

    #[test]
    fn quarter_turns_rejects_arbitrary_angles() {
        assert_eq!(quarter_turns(45.0), None);
        assert_eq!(quarter_turns(22.5), None);
        assert_eq!(quarter_turns(-90.0), None);
        assert_eq!(quarter_turns(f64::NAN), None);
    }

    // =========================================================================
    // rotated_dimensions tests
    // =========================================================================

    #[test]
    fn rotated_swaps_on_odd_turns() {
        assert_eq!(rotated_dimensions((400, 300), 0), (400, 300));
        assert_eq!(rotated_dimensions((400, 300), 1), (300, 400));
        assert_eq!(rotated_dimensions((400, 300), 2), (400, 300));
        assert_eq!(rotated_dimensions((400, 300), 3), (300, 400));
    }
}
