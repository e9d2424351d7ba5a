//! # Instrument Layer
//!
//! Tracing around every call that reaches it. Place it outside the cache
//! layer to observe every call, or inside to observe only cache misses.

use crate::chain::{Layer, Next};
use std::time::Instant;
use tracing::{debug, warn};
use weave_types::OperationError;

/// Decorator layer emitting structured trace events per call.
pub struct InstrumentLayer {
    target: String,
}

impl InstrumentLayer {
    /// Create an instrument layer labelled with the operation it observes.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl<I, O> Layer<I, O> for InstrumentLayer {
    fn name(&self) -> &str {
        "instrument"
    }

    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError> {
        let start = Instant::now();
        let result = next.invoke(input);
        let elapsed = start.elapsed();

        match &result {
            Ok(_) => debug!(
                operation = %self.target,
                elapsed_us = elapsed.as_micros() as u64,
                "Operation completed"
            ),
            Err(error) => warn!(
                operation = %self.target,
                elapsed_us = elapsed.as_micros() as u64,
                error = %error,
                "Operation failed"
            ),
        }

        result
    }
}
