//! # Operation Contract
//!
//! The single operation signature spoken across the engine: registries
//! construct things that expose it, decorator chains wrap it, strategies
//! implement a role-specific variant of it.
//!
//! ## Error Flow
//!
//! Externally-supplied code fails with whatever error type it likes, boxed
//! as [`BoxError`]. The engine wraps that as [`OperationError::Inner`] and
//! passes it upward unchanged; only engine-owned layers produce the
//! `Timeout` and `RateLimited` variants.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Boxed error for opaque passthrough of externally-supplied failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by invoking a wrapped operation.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The inner call exceeded its deadline.
    #[error("operation timed out after {elapsed:?} (deadline {deadline:?})")]
    Timeout {
        /// Time actually waited before giving up.
        elapsed: Duration,
        /// The configured deadline.
        deadline: Duration,
    },

    /// Admission was refused by a rate-limiting layer.
    #[error("rate limit exceeded (bucket empty, refill in ~{retry_after:?})")]
    RateLimited {
        /// Estimated wait until a token becomes available.
        retry_after: Duration,
    },

    /// The wrapped operation itself failed. Opaque passthrough.
    #[error("inner operation failed: {source}")]
    Inner {
        #[from]
        source: BoxError,
    },
}

impl OperationError {
    /// Wrap an arbitrary error as an inner-operation failure.
    pub fn inner(err: impl Into<BoxError>) -> Self {
        Self::Inner { source: err.into() }
    }

    /// True if this is an inner-operation failure (retriable by a retry
    /// layer; `Timeout` and `RateLimited` are not).
    #[must_use]
    pub fn is_inner(&self) -> bool {
        matches!(self, Self::Inner { .. })
    }
}

/// A callable with the engine's canonical signature.
///
/// Implemented by base operations handed to a decorator chain and by the
/// chain itself, so chains compose with anything that speaks the contract.
pub trait Operation<I, O>: Send + Sync {
    /// Invoke the operation.
    ///
    /// # Errors
    ///
    /// Whatever the operation raises, surfaced through [`OperationError`].
    fn call(&self, input: I) -> Result<O, OperationError>;
}

impl<I, O> fmt::Debug for dyn Operation<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation")
    }
}

/// Adapter turning a closure into an [`Operation`].
///
/// The closure returns `Result<O, BoxError>`; failures are wrapped as
/// [`OperationError::Inner`].
pub struct FnOperation<F> {
    func: F,
}

impl<F> FnOperation<F> {
    /// Wrap a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<I, O, F> Operation<I, O> for FnOperation<F>
where
    F: Fn(I) -> Result<O, BoxError> + Send + Sync,
{
    fn call(&self, input: I) -> Result<O, OperationError> {
        (self.func)(input).map_err(OperationError::from)
    }
}
