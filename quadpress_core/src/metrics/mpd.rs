//! Maximum pixel difference (max - min per channel).

use super::ErrorMetric;
use crate::quadtree::Rect;
use crate::raster::Raster;

const UPPER_BOUND: f64 = 255.0;
const LOWER_BOUND: f64 = 0.0;

/// Per-channel max-min over the block, averaged over RGB. Direct pixel
/// scan with an early exit once every channel spans the full 0-255 range.
pub struct MaximumPixelDifference;

impl ErrorMetric for MaximumPixelDifference {
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64 {
        let first = raster.color_at(rect.x, rect.y);
        let mut max = first;
        let mut min = first;

        for x in rect.x..rect.x + rect.width {
            for y in rect.y..rect.y + rect.height {
                let color = raster.color_at(x, y);
                for c in 0..3 {
                    max[c] = max[c].max(color[c]);
                    min[c] = min[c].min(color[c]);
                }
                if max == [255, 255, 255] && min == [0, 0, 0] {
                    return UPPER_BOUND;
                }
            }
        }

        let spread: u32 = (0..3).map(|c| (max[c] - min[c]) as u32).sum();
        spread as f64 / 3.0
    }

    fn lower_bound(&self) -> f64 {
        LOWER_BOUND
    }

    fn upper_bound(&self) -> f64 {
        UPPER_BOUND
    }

    fn identifier(&self) -> &'static str {
        "MPD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::solid_raster;

    #[test]
    fn test_solid_block_zero_spread() {
        let raster = solid_raster(6, 6, [77, 77, 77]);
        let error = MaximumPixelDifference.calculate_error(&raster, Rect::new(0, 0, 6, 6));
        assert_eq!(error, 0.0);
    }

    #[test]
    fn test_full_span_early_exit() {
        let mut raster = solid_raster(4, 4, [0, 0, 0]);
        raster.set_color_at(1, 1, 255, 255, 255);
        let error = MaximumPixelDifference.calculate_error(&raster, Rect::new(0, 0, 4, 4));
        assert_eq!(error, 255.0);
    }

    #[test]
    fn test_partial_spread_average() {
        let mut raster = solid_raster(2, 1, [10, 20, 30]);
        raster.set_color_at(1, 0, 40, 20, 90);
        // Spreads: 30, 0, 60 -> average 30.
        let error = MaximumPixelDifference.calculate_error(&raster, Rect::new(0, 0, 2, 1));
        assert!((error - 30.0).abs() < 1e-9);
    }
}
