//! Shannon entropy over per-channel 8-bit histograms.

use super::ErrorMetric;
use crate::quadtree::Rect;
use crate::raster::Raster;

// 8-bit channel: log2(256) = 8.
const UPPER_BOUND: f64 = 8.0;
const LOWER_BOUND: f64 = 0.0;

/// `-sum(p * log2 p)` over populated histogram bins, averaged over RGB.
pub struct Entropy;

impl ErrorMetric for Entropy {
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64 {
        let count = rect.area() as f64;
        let mut hist = [[0u32; 256]; 3];

        for x in rect.x..rect.x + rect.width {
            for y in rect.y..rect.y + rect.height {
                let color = raster.color_at(x, y);
                for c in 0..3 {
                    hist[c][color[c] as usize] += 1;
                }
            }
        }

        let mut total = 0.0;
        for channel in &hist {
            let mut entropy = 0.0;
            for &bin in channel.iter() {
                if bin > 0 {
                    let p = bin as f64 / count;
                    entropy -= p * p.log2();
                }
            }
            total += entropy;
        }
        total / 3.0
    }

    fn lower_bound(&self) -> f64 {
        LOWER_BOUND
    }

    fn upper_bound(&self) -> f64 {
        UPPER_BOUND
    }

    fn identifier(&self) -> &'static str {
        "ENT"
    }
}
