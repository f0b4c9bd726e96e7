//! Pure calculation functions for print dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use crate::spec_sheet::ResizeMode;

/// Fixed print resolution for every mode.
pub const DPI: f64 = 300.0;

/// Convert physical inches into the requested pixel box.
///
/// Width comes from the width column, height from the length column.
///
/// # Examples
/// ```
/// # use printbatch::imaging::requested_pixels;
/// // 8.5in long, 11in wide → 3300 wide, 2550 high
/// let px = requested_pixels(8.5, 11.0);
/// assert_eq!((px.width, px.height), (3300, 2550));
/// ```
pub fn requested_pixels(length_inches: f64, width_inches: f64) -> Dimensions {
    Dimensions {
        width: (width_inches * DPI).round() as u32,
        height: (length_inches * DPI).round() as u32,
    }
}

/// Fit the source aspect ratio onto the smaller requested side.
///
/// Landscape and square sources take `base` as their width, portrait sources
/// take it as their height. The other side follows the source aspect ratio
/// and never drops below one pixel.
pub fn constrained_dimensions(source: Dimensions, requested: Dimensions) -> Dimensions {
    let base = requested.width.min(requested.height).max(1);
    let aspect = source.width as f64 / source.height.max(1) as f64;

    if aspect >= 1.0 {
        Dimensions {
            width: base,
            height: ((base as f64 / aspect).round() as u32).max(1),
        }
    } else {
        Dimensions {
            width: ((base as f64 * aspect).round() as u32).max(1),
            height: base,
        }
    }
}

/// Final output box for a row, given the mode and the source size.
pub fn target_dimensions(mode: ResizeMode, source: Dimensions, requested: Dimensions) -> Dimensions {
    match mode {
        ResizeMode::Constrained => constrained_dimensions(source, requested),
        ResizeMode::File | ResizeMode::Brand => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // =========================================================================
    // requested_pixels tests
    // =========================================================================

    #[test]
    fn requested_maps_width_column_to_width() {
        assert_eq!(requested_pixels(8.5, 11.0), dims(3300, 2550));
    }

    #[test]
    fn requested_rounds_to_nearest() {
        // 0.0015in * 300 = 0.45 → 0, 1.0025in * 300 = 300.75 → 301
        assert_eq!(requested_pixels(1.0025, 0.0015), dims(0, 301));
    }

    // =========================================================================
    // target_dimensions tests
    // =========================================================================

    #[test]
    fn file_mode_ignores_source_aspect() {
        let requested = requested_pixels(8.5, 11.0);
        assert_eq!(
            target_dimensions(ResizeMode::File, dims(1000, 1000), requested),
            dims(3300, 2550)
        );
    }

    #[test]
    fn brand_mode_matches_file_mode() {
        let requested = requested_pixels(4.0, 3.0);
        assert_eq!(
            target_dimensions(ResizeMode::Brand, dims(640, 480), requested),
            dims(900, 1200)
        );
    }

    #[test]
    fn constrained_landscape_anchors_width() {
        // 16:9 source, smaller side 2550 → 2550 x 1434
        let requested = requested_pixels(8.5, 11.0);
        assert_eq!(
            target_dimensions(ResizeMode::Constrained, dims(1600, 900), requested),
            dims(2550, 1434)
        );
    }

    #[test]
    fn constrained_portrait_anchors_height() {
        // 3:4 source, smaller side 1200 → 900 x 1200
        let requested = requested_pixels(4.0, 6.0);
        assert_eq!(
            target_dimensions(ResizeMode::Constrained, dims(300, 400), requested),
            dims(900, 1200)
        );
    }

    #[test]
    fn constrained_square_source_is_square() {
        let requested = requested_pixels(2.0, 5.0);
        assert_eq!(
            constrained_dimensions(dims(500, 500), requested),
            dims(600, 600)
        );
    }

    #[test]
    fn constrained_never_collapses_to_zero() {
        // Extreme panorama: 10000x1 onto a 300px base
        assert_eq!(constrained_dimensions(dims(10000, 1), dims(300, 300)), dims(300, 1));
        // Zero requested box still yields a 1px base
        assert_eq!(constrained_dimensions(dims(1, 10000), dims(0, 0)), dims(1, 1));
    }

    #[test]
    fn constrained_preserves_aspect_within_rounding() {
        let sources = [(4000, 3000), (3000, 4000), (1920, 1080), (123, 457), (999, 1000)];
        let requests = [(1.0, 1.0), (8.5, 11.0), (2.25, 3.5), (0.5, 7.0)];
        for (sw, sh) in sources {
            for (length, width) in requests {
                let t = constrained_dimensions(dims(sw, sh), requested_pixels(length, width));
                let source_aspect = sw as f64 / sh as f64;
                let target_aspect = t.width as f64 / t.height as f64;
                let bound = 1.0 / t.width.min(t.height) as f64;
                assert!(
                    (target_aspect - source_aspect).abs() <= bound,
                    "{sw}x{sh} @ {length}x{width} → {}x{}",
                    t.width,
                    t.height
                );
            }
        }
    }
}
