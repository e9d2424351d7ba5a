//! # Rate Limit Layer
//!
//! Token bucket admission control in front of the inner chain.
//!
//! # Algorithm
//!
//! - Tokens are added at a fixed rate, up to a burst capacity
//! - Each call consumes one token
//! - Calls are rejected with `RateLimited` when no tokens are available

use crate::chain::{Layer, Next};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;
use weave_types::OperationError;

/// Decorator layer enforcing a token-bucket rate limit.
pub struct RateLimitLayer {
    /// Maximum tokens in bucket.
    capacity: u64,
    /// Tokens to add per second.
    refill_rate: u64,
    /// Current token count.
    tokens: AtomicU64,
    /// Last refill time.
    last_refill: Mutex<Instant>,
}

impl RateLimitLayer {
    /// Create a rate limit layer.
    ///
    /// # Parameters
    ///
    /// - `capacity`: Maximum burst size (clamped to at least 1)
    /// - `refill_rate`: Tokens per second (clamped to at least 1)
    #[must_use]
    pub fn new(capacity: u64, refill_rate: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            refill_rate: refill_rate.max(1),
            tokens: AtomicU64::new(capacity),
            last_refill: Mutex::new(Instant::now()),
        }
    }

    /// Current available tokens.
    #[must_use]
    pub fn available(&self) -> u64 {
        self.refill();
        self.tokens.load(Ordering::Relaxed)
    }

    fn try_acquire(&self) -> bool {
        self.refill();

        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current == 0 {
                return false;
            }

            if self
                .tokens
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&self) {
        let mut last = self.last_refill.lock();
        let now = Instant::now();
        let elapsed = now.duration_since(*last);

        let tokens_to_add = (elapsed.as_secs_f64() * self.refill_rate as f64) as u64;

        if tokens_to_add > 0 {
            *last = now;

            loop {
                let current = self.tokens.load(Ordering::Relaxed);
                let new_value = (current + tokens_to_add).min(self.capacity);

                if self
                    .tokens
                    .compare_exchange(current, new_value, Ordering::SeqCst, Ordering::Relaxed)
                    .is_ok()
                {
                    break;
                }
            }
        }
    }

    fn retry_after(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refill_rate as f64)
    }
}

impl<I, O> Layer<I, O> for RateLimitLayer {
    fn name(&self) -> &str {
        "rate-limit"
    }

    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError> {
        if self.try_acquire() {
            next.invoke(input)
        } else {
            let retry_after = self.retry_after();
            warn!(
                capacity = self.capacity,
                refill_rate = self.refill_rate,
                "Call rejected by rate limit"
            );
            Err(OperationError::RateLimited { retry_after })
        }
    }
}
