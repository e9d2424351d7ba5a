//! # Retry Layer
//!
//! Bounded re-invocation of the inner chain on inner-operation failures.
//! Engine-produced errors (`Timeout`, `RateLimited`) are not retried:
//! retrying a deadline that already expired or a bucket that is still
//! empty only compounds the problem.
//!
//! Requires `I: Clone` - each attempt gets its own copy of the input.

use crate::chain::{Layer, Next};
use std::time::Duration;
use tracing::warn;
use weave_types::OperationError;

/// Decorator layer retrying inner failures with a fixed backoff.
pub struct RetryLayer {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryLayer {
    /// Create a retry layer. `max_attempts` counts the initial attempt and
    /// is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl<I, O> Layer<I, O> for RetryLayer
where
    I: Clone,
{
    fn name(&self) -> &str {
        "retry"
    }

    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match next.invoke(input.clone()) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_inner() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Attempt failed, retrying"
                    );
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                }
                Err(error) => return Err(error),
            }
        }
    }
}
