//! Target-compression tuner
//!
//! Binary search over the active metric's threshold range for a threshold
//! whose compressed output approximates a target byte size. Every probe is
//! a full build + flatten + in-memory trial encode; nothing touches disk.
//!
//! Size is monotonic in the threshold when walked from the metric's
//! tightest extreme (everything subdivides, biggest output) to its loosest
//! (everything accepted, smallest output), so plain bisection applies once
//! the endpoints are probed. Inverted-polarity metrics just swap which
//! numeric end is which.

use crate::app_error::AppError;
use crate::float_compare::THRESHOLD_EPSILON;
use crate::metrics::ErrorMetric;
use crate::quadtree::Quadtree;
use crate::raster::{Raster, RasterFormat};
use crate::types::{IterationGuard, TUNER_MAX_ITERATIONS};

/// Accept a probe whose size lands within this many bytes of the target.
const SIZE_TOLERANCE_BYTES: u64 = 10;

/// What the search settled on.
#[derive(Debug, Clone, Copy)]
pub struct TunerOutcome {
    pub threshold: f64,
    /// Bisection steps taken (endpoint probes excluded).
    pub iterations: u32,
    /// Estimated encoded size at the returned threshold.
    pub achieved_size: u64,
}

fn trial_size(
    raster: &Raster,
    metric: &dyn ErrorMetric,
    threshold: f64,
    min_block_size: u32,
    format: RasterFormat,
) -> Result<u64, AppError> {
    let tree = Quadtree::build(raster, metric, threshold, min_block_size);
    tree.apply(raster).estimate_encoded_size(format)
}

/// Find a threshold whose compressed size approximates `target_size`.
///
/// Targets outside the achievable span clamp to the nearest endpoint.
/// Non-convergence within the iteration cap is not an error; the last
/// midpoint is accepted.
///
/// The raster must carry the prefix table(s) the metric requires.
pub fn find_target_threshold(
    raster: &Raster,
    metric: &dyn ErrorMetric,
    min_block_size: u32,
    target_size: u64,
    format: RasterFormat,
) -> Result<TunerOutcome, AppError> {
    let (mut tight, mut loose) = metric.threshold_search_range();

    let tight_size = trial_size(raster, metric, tight, min_block_size, format)?;
    if target_size > tight_size {
        tracing::debug!(target_size, tight_size, "Target above achievable span, clamping");
        return Ok(TunerOutcome {
            threshold: tight,
            iterations: 0,
            achieved_size: tight_size,
        });
    }

    let loose_size = trial_size(raster, metric, loose, min_block_size, format)?;
    if target_size < loose_size {
        tracing::debug!(target_size, loose_size, "Target below achievable span, clamping");
        return Ok(TunerOutcome {
            threshold: loose,
            iterations: 0,
            achieved_size: loose_size,
        });
    }

    let mut guard = IterationGuard::new(TUNER_MAX_ITERATIONS, "threshold search");
    let mut mid = (tight + loose) / 2.0;
    let mut mid_size = tight_size;

    while guard.increment().is_ok() {
        mid = (tight + loose) / 2.0;
        if (mid - tight).abs() < THRESHOLD_EPSILON && (mid - loose).abs() < THRESHOLD_EPSILON {
            break;
        }
        mid_size = trial_size(raster, metric, mid, min_block_size, format)?;
        tracing::debug!(
            iteration = guard.current(),
            threshold = mid,
            size = mid_size,
            target_size,
            "Tuner probe"
        );

        if mid_size.abs_diff(target_size) < SIZE_TOLERANCE_BYTES {
            break;
        }
        if target_size > mid_size {
            // Need a bigger output: move toward the tight extreme.
            loose = mid;
        } else {
            tight = mid;
        }
    }

    Ok(TunerOutcome {
        threshold: mid,
        iterations: guard.current().min(guard.max()),
        achieved_size: mid_size,
    })
}
