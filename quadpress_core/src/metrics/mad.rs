//! Mean absolute deviation from the block mean.

use super::ErrorMetric;
use crate::quadtree::Rect;
use crate::raster::{Raster, COLOR_CHANNELS};

const UPPER_BOUND: f64 = 127.5;
const LOWER_BOUND: f64 = 0.0;

/// Per-pixel |value - channel mean|, averaged over the block and over RGB.
/// The mean comes from the prefix table; the deviation needs a pixel scan.
pub struct MeanAbsoluteDeviation;

impl ErrorMetric for MeanAbsoluteDeviation {
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64 {
        let count = rect.area() as f64;
        let mut means = [0.0f64; COLOR_CHANNELS];
        for (c, mean) in means.iter_mut().enumerate() {
            *mean = raster.channel_block_sum(rect.x, rect.y, rect.width, rect.height, c) as f64
                / count;
        }

        let mut deviation = [0.0f64; COLOR_CHANNELS];
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let color = raster.color_at(x, y);
                for c in 0..COLOR_CHANNELS {
                    deviation[c] += (color[c] as f64 - means[c]).abs();
                }
            }
        }

        deviation.iter().map(|d| d / count).sum::<f64>() / COLOR_CHANNELS as f64
    }

    fn lower_bound(&self) -> f64 {
        LOWER_BOUND
    }

    fn upper_bound(&self) -> f64 {
        UPPER_BOUND
    }

    fn identifier(&self) -> &'static str {
        "MAD"
    }
}
