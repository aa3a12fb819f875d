//! Per-block error metrics
//!
//! Each metric scores how far a rectangular block is from being
//! representable by its average color. The quadtree builder and the
//! threshold tuner never compare against a threshold themselves; polarity
//! lives behind `is_quality_acceptable`, because the similarity metric
//! inverts it (higher score = more uniform = acceptable).

mod entropy;
mod mad;
mod mpd;
mod ssim;
mod variance;

pub use entropy::Entropy;
pub use mad::MeanAbsoluteDeviation;
pub use mpd::MaximumPixelDifference;
pub use ssim::StructuralSimilarity;
pub use variance::Variance;

use crate::quadtree::Rect;
use crate::raster::Raster;
use std::fmt;
use std::str::FromStr;

/// Strategy interface for block error measurement.
///
/// VAR and SIM require both prefix tables on the raster; MAD requires the
/// linear table; MPD and ENT scan pixels directly. Calling a metric
/// without its required table is a contract violation and panics.
pub trait ErrorMetric: Send + Sync {
    /// Scalar error/acceptability score for the given block.
    fn calculate_error(&self, raster: &Raster, rect: Rect) -> f64;

    fn lower_bound(&self) -> f64;

    fn upper_bound(&self) -> f64;

    /// Whether a candidate threshold lies in the metric's closed range.
    fn is_in_error_bound(&self, value: f64) -> bool {
        value.is_finite() && value >= self.lower_bound() && value <= self.upper_bound()
    }

    /// Whether a block with this error passes at this threshold.
    /// Default polarity: smaller error is better.
    fn is_quality_acceptable(&self, error: f64, threshold: f64) -> bool {
        error <= threshold
    }

    /// Short tag identifying the metric ("VAR", "MPD", ...).
    fn identifier(&self) -> &'static str;

    /// Whether `calculate_error` reads the summed-square table.
    fn needs_square_table(&self) -> bool {
        false
    }

    /// `(tightest, loosest)` threshold extremes for size search.
    ///
    /// The tightest threshold subdivides everything (largest output), the
    /// loosest accepts everything (smallest output). Inverted-polarity
    /// metrics swap the endpoints.
    fn threshold_search_range(&self) -> (f64, f64) {
        (self.lower_bound(), self.upper_bound())
    }
}

/// Metric selector, the session-configuration face of the five metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Variance,
    MeanAbsoluteDeviation,
    MaximumPixelDifference,
    Entropy,
    StructuralSimilarity,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Variance,
        MetricKind::MeanAbsoluteDeviation,
        MetricKind::MaximumPixelDifference,
        MetricKind::Entropy,
        MetricKind::StructuralSimilarity,
    ];

    /// Construct the boxed strategy for this selector.
    pub fn create(self) -> Box<dyn ErrorMetric> {
        match self {
            MetricKind::Variance => Box::new(Variance),
            MetricKind::MeanAbsoluteDeviation => Box::new(MeanAbsoluteDeviation),
            MetricKind::MaximumPixelDifference => Box::new(MaximumPixelDifference),
            MetricKind::Entropy => Box::new(Entropy),
            MetricKind::StructuralSimilarity => Box::new(StructuralSimilarity),
        }
    }

    pub fn identifier(self) -> &'static str {
        match self {
            MetricKind::Variance => "VAR",
            MetricKind::MeanAbsoluteDeviation => "MAD",
            MetricKind::MaximumPixelDifference => "MPD",
            MetricKind::Entropy => "ENT",
            MetricKind::StructuralSimilarity => "SIM",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VAR" => Ok(MetricKind::Variance),
            "MAD" => Ok(MetricKind::MeanAbsoluteDeviation),
            "MPD" => Ok(MetricKind::MaximumPixelDifference),
            "ENT" => Ok(MetricKind::Entropy),
            "SIM" => Ok(MetricKind::StructuralSimilarity),
            other => Err(format!("unknown error metric: {other}")),
        }
    }
}
