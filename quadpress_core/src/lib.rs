//! Quadtree image compression engine
//!
//! This crate provides the core of the quadpress tool:
//! - Raster buffer with summed-area tables for O(1) block queries
//! - Pluggable per-block error metrics (VAR, MAD, MPD, ENT, SIM)
//! - Breadth-first quadtree build + flatten/animate passes
//! - Binary-search tuner that maps a target byte size to a threshold
//! - Compression session controller with stage notifications

pub mod app_error;
pub mod float_compare;
pub mod logging;
pub mod metrics;
pub mod quadtree;
pub mod raster;
pub mod sequence;
pub mod session;
pub mod tuner;
pub mod types;

pub use app_error::{AppError, ErrorCategory};
pub use metrics::{
    Entropy, ErrorMetric, MaximumPixelDifference, MeanAbsoluteDeviation, MetricKind,
    StructuralSimilarity, Variance,
};
pub use quadtree::{Quadtree, QuadtreeNode, Rect, DEFAULT_FRAME_DELAY_MS};
pub use raster::{Raster, RasterFormat};
pub use sequence::RasterSequence;
pub use session::{CompressionReport, CompressionSession, Stage};
pub use tuner::{find_target_threshold, TunerOutcome};
pub use types::{
    FileSize, IterationError, IterationGuard, Threshold, ThresholdError, TUNER_MAX_ITERATIONS,
};

pub use float_compare::{approx_eq_f64, approx_ge_f64, approx_le_f64, approx_zero_f64, F64_EPSILON};
