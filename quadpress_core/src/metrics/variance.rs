//! Per-channel variance via the two prefix tables.

use super::ErrorMetric;
use crate::quadtree::Rect;
use crate::raster::{Raster, COLOR_CHANNELS};

const UPPER_BOUND: f64 = 127.5 * 127.5;
const LOWER_BOUND: f64 = 0.0;

/// `E[X^2] - E[X]^2` per channel, averaged over RGB.
pub struct Variance;

impl ErrorMetric for Variance {
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64 {
        let count = rect.area() as f64;
        let mut total = 0.0;
        for c in 0..COLOR_CHANNELS {
            let sum = raster.channel_block_sum(rect.x, rect.y, rect.width, rect.height, c);
            let sum_sq =
                raster.channel_square_block_sum(rect.x, rect.y, rect.width, rect.height, c);
            let mean = sum as f64 / count;
            total += sum_sq as f64 / count - mean * mean;
        }
        total / COLOR_CHANNELS as f64
    }

    fn lower_bound(&self) -> f64 {
        LOWER_BOUND
    }

    fn upper_bound(&self) -> f64 {
        UPPER_BOUND
    }

    fn identifier(&self) -> &'static str {
        "VAR"
    }

    fn needs_square_table(&self) -> bool {
        true
    }
}
