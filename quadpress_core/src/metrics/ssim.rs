//! Single-block structural similarity score.
//!
//! Comparing a block against its own average collapses the full SSIM
//! formula (Wang et al. 2004) to `C2 / (variance + C2)` per channel: the
//! luminance term cancels and the covariance term vanishes.

use super::ErrorMetric;
use crate::quadtree::Rect;
use crate::raster::{Raster, COLOR_CHANNELS};

const UPPER_BOUND: f64 = 1.0;
const LOWER_BOUND: f64 = 0.0;
/// Wang et al. stability constant: (0.03 * 255)^2.
const C2: f64 = 58.5225;

/// `C2 / (variance + C2)` per channel, averaged over RGB.
///
/// Polarity is inverted relative to the other metrics: 1.0 means the
/// block equals its average, so *higher* is acceptable.
pub struct StructuralSimilarity;

impl ErrorMetric for StructuralSimilarity {
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64 {
        let count = rect.area() as f64;
        let mut total = 0.0;
        for c in 0..COLOR_CHANNELS {
            let sum = raster.channel_block_sum(rect.x, rect.y, rect.width, rect.height, c);
            let sum_sq =
                raster.channel_square_block_sum(rect.x, rect.y, rect.width, rect.height, c);
            let mean = sum as f64 / count;
            let variance = sum_sq as f64 / count - mean * mean;
            total += C2 / (variance + C2);
        }
        total / COLOR_CHANNELS as f64
    }

    fn lower_bound(&self) -> f64 {
        LOWER_BOUND
    }

    fn upper_bound(&self) -> f64 {
        UPPER_BOUND
    }

    /// Higher similarity means more acceptable.
    fn is_quality_acceptable(&self, error: f64, threshold: f64) -> bool {
        error >= threshold
    }

    fn identifier(&self) -> &'static str {
        "SIM"
    }

    fn needs_square_table(&self) -> bool {
        true
    }

    /// Swapped: threshold 1.0 subdivides everything, 0.0 accepts everything.
    fn threshold_search_range(&self) -> (f64, f64) {
        (self.upper_bound(), self.lower_bound())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{noisy_raster, solid_raster};

    fn prepared(raster: &mut Raster) {
        raster.compute_summed_area_table();
        raster.compute_summed_square_table();
    }

    #[test]
    fn test_solid_block_scores_one() {
        let mut raster = solid_raster(8, 8, [50, 100, 150]);
        prepared(&mut raster);
        let score = StructuralSimilarity.calculate_error(&raster, Rect::new(0, 0, 8, 8));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_block_scores_below_one() {
        let mut raster = noisy_raster(16, 16, 7);
        prepared(&mut raster);
        let score = StructuralSimilarity.calculate_error(&raster, Rect::new(0, 0, 16, 16));
        assert!(score > 0.0 && score < 0.5, "noisy block scored {score}");
    }

    #[test]
    fn test_inverted_polarity() {
        let metric = StructuralSimilarity;
        assert!(metric.is_quality_acceptable(0.9, 0.5));
        assert!(!metric.is_quality_acceptable(0.4, 0.5));
        // Loosest threshold accepts everything.
        let (tightest, loosest) = metric.threshold_search_range();
        assert_eq!(tightest, 1.0);
        assert_eq!(loosest, 0.0);
    }
}
