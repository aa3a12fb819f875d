//! Unified floating-point comparison helpers.

/// Epsilon for f64 comparisons.
pub const F64_EPSILON: f64 = 1e-6;

/// Interval-collapse tolerance for the threshold bisection.
pub const THRESHOLD_EPSILON: f64 = 1e-5;

#[inline]
pub fn approx_eq_f64(a: f64, b: f64) -> bool {
    (a - b).abs() < F64_EPSILON
}

#[inline]
pub fn approx_zero_f64(a: f64) -> bool {
    a.abs() < F64_EPSILON
}

#[inline]
pub fn approx_le_f64(a: f64, b: f64) -> bool {
    a < b + F64_EPSILON
}

#[inline]
pub fn approx_ge_f64(a: f64, b: f64) -> bool {
    a > b - F64_EPSILON
}
