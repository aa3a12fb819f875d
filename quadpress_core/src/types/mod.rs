//! Type-safe wrappers for the values the session and tuner pass around.

pub mod file_size;
pub mod iteration;
pub mod threshold;

pub use file_size::FileSize;
pub use iteration::{IterationError, IterationGuard, EMERGENCY_MAX_ITERATIONS, TUNER_MAX_ITERATIONS};
pub use threshold::{Threshold, ThresholdError};
