//! Validated error-metric threshold.
//!
//! The valid range depends on the active metric, so construction takes the
//! metric's bounds. Out-of-range values are rejected, never clamped.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("threshold {value} out of range [{lower}, {upper}]")]
    OutOfRange { value: f64, lower: f64, upper: f64 },
    #[error("invalid threshold: NaN or Infinity")]
    InvalidFloat,
}

/// A threshold known to lie inside one metric's closed valid range.
#[derive(Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64, lower: f64, upper: f64) -> Result<Self, ThresholdError> {
        if value.is_nan() || value.is_infinite() {
            return Err(ThresholdError::InvalidFloat);
        }
        if value < lower || value > upper {
            return Err(ThresholdError::OutOfRange {
                value,
                lower,
                upper,
            });
        }
        Ok(Self(value))
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Debug for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Threshold({:.6})", self.0)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_threshold() {
        let t = Threshold::new(12.5, 0.0, 255.0).unwrap();
        assert_eq!(t.value(), 12.5);
        assert!(Threshold::new(0.0, 0.0, 255.0).is_ok());
        assert!(Threshold::new(255.0, 0.0, 255.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            Threshold::new(-0.1, 0.0, 1.0),
            Err(ThresholdError::OutOfRange { .. })
        ));
        assert!(matches!(
            Threshold::new(1.1, 0.0, 1.0),
            Err(ThresholdError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_nan_inf_rejected() {
        assert_eq!(
            Threshold::new(f64::NAN, 0.0, 1.0),
            Err(ThresholdError::InvalidFloat)
        );
        assert_eq!(
            Threshold::new(f64::INFINITY, 0.0, 1.0),
            Err(ThresholdError::InvalidFloat)
        );
    }

    #[test]
    fn test_error_display() {
        let err = Threshold::new(2.0, 0.0, 1.0).unwrap_err();
        assert_eq!(err.to_string(), "threshold 2 out of range [0, 1]");
    }
}
