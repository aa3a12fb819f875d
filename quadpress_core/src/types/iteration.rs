//! Bounded-loop guard for the threshold search.

use thiserror::Error;

/// Bisection cap for the target-compression tuner. With the two endpoint
/// probes this bounds the search at ~34 full trial encodes.
pub const TUNER_MAX_ITERATIONS: u32 = 32;

/// Hard ceiling no guard may exceed, whatever the caller asks for.
pub const EMERGENCY_MAX_ITERATIONS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("iteration limit exceeded: {current}/{max} in {context}")]
pub struct IterationError {
    pub current: u32,
    pub max: u32,
    pub context: String,
}

/// Counts loop iterations and errors out past the cap.
#[derive(Debug, Clone)]
pub struct IterationGuard {
    current: u32,
    max: u32,
    context: String,
}

impl IterationGuard {
    pub fn new(max: u32, context: &str) -> Self {
        Self {
            current: 0,
            max: max.min(EMERGENCY_MAX_ITERATIONS),
            context: context.to_string(),
        }
    }

    pub fn increment(&mut self) -> Result<u32, IterationError> {
        self.current += 1;
        if self.current > self.max {
            Err(IterationError {
                current: self.current,
                max: self.max,
                context: self.context.clone(),
            })
        } else {
            Ok(self.current)
        }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.current)
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.max
    }

    pub fn reset(&mut self) {
        self.current = 0;
    }
}
