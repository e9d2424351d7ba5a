//! # StrategyContext Implementation
//!
//! ## Swap Atomicity
//!
//! The active strategy is an `Option<Arc<dyn Strategy>>` behind a
//! `parking_lot::RwLock`. `invoke` clones the `Arc` under the read lock and
//! drops the lock before executing, so every invocation runs exactly the
//! strategy that was active at its start; `set_strategy` replaces the
//! pointer under the write lock in one step. A strategy released by a swap
//! is not destroyed while an in-flight invocation still holds its clone.
//!
//! ## Reentrancy Guard
//!
//! A per-thread in-flight counter (keyed by `ThreadId`) tracks invocations.
//! `set_strategy` from a thread that is currently inside `invoke` would be
//! a strategy mutating its own context mid-call; that is rejected with
//! `ReentrantSwap` instead of being left as undefined behavior.

use crate::errors::StrategyError;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, trace};
use weave_types::BoxError;

/// An interchangeable algorithm implementation for a fixed role signature.
pub trait Strategy<I, O>: Send + Sync {
    /// Strategy name (debugging and error context).
    fn name(&self) -> &str;

    /// Execute the algorithm.
    ///
    /// # Errors
    ///
    /// Whatever the algorithm raises; carried through unchanged.
    fn execute(&self, input: I) -> Result<O, BoxError>;
}

/// Adapter turning a named closure into a [`Strategy`].
pub struct FnStrategy<F> {
    name: String,
    func: F,
}

impl<F> FnStrategy<F> {
    /// Wrap a closure under a strategy name.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<I, O, F> Strategy<I, O> for FnStrategy<F>
where
    F: Fn(I) -> Result<O, BoxError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, input: I) -> Result<O, BoxError> {
        (self.func)(input)
    }
}

/// Current algorithm holder for a role.
///
/// The context exclusively owns the pointer to the active strategy; the
/// previous strategy is released on swap, not destroyed if externally held.
pub struct StrategyContext<I, O> {
    active: RwLock<Option<Arc<dyn Strategy<I, O>>>>,
    in_flight: Mutex<HashMap<ThreadId, usize>>,
}

impl<I, O> StrategyContext<I, O> {
    /// Create a context with no strategy assigned.
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Create a context with an initial strategy.
    #[must_use]
    pub fn with_strategy(strategy: Arc<dyn Strategy<I, O>>) -> Self {
        Self {
            active: RwLock::new(Some(strategy)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically replace the active strategy.
    ///
    /// Returns the previously active strategy, if any, so an external
    /// holder can keep using or tear it down.
    ///
    /// # Errors
    ///
    /// `StrategyError::ReentrantSwap` if called from within `invoke` on the
    /// same thread. The active pointer is left unchanged.
    pub fn set_strategy(
        &self,
        strategy: Arc<dyn Strategy<I, O>>,
    ) -> Result<Option<Arc<dyn Strategy<I, O>>>, StrategyError> {
        let current = thread::current().id();
        if self.in_flight.lock().get(&current).copied().unwrap_or(0) > 0 {
            return Err(StrategyError::ReentrantSwap);
        }

        let name = strategy.name().to_string();
        let previous = {
            let mut active = self.active.write();
            active.replace(strategy)
        };

        debug!(
            strategy = %name,
            previous = previous.as_deref().map(|s| s.name()),
            "Strategy swapped"
        );
        Ok(previous)
    }

    /// Invoke whichever strategy is active at the moment of the call.
    ///
    /// # Errors
    ///
    /// - `StrategyError::NotSet` if no strategy has ever been assigned.
    /// - `StrategyError::Execution` carrying the strategy's own error.
    pub fn invoke(&self, input: I) -> Result<O, StrategyError> {
        let strategy = {
            let active = self.active.read();
            active.clone().ok_or(StrategyError::NotSet)?
        };

        trace!(strategy = strategy.name(), "Invoking strategy");
        let _guard = InFlightGuard::enter(&self.in_flight);
        strategy
            .execute(input)
            .map_err(|source| StrategyError::Execution {
                strategy: strategy.name().to_string(),
                source,
            })
    }

    /// Whether a strategy has been assigned.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.active.read().is_some()
    }

    /// Name of the active strategy, if any.
    #[must_use]
    pub fn active_strategy_name(&self) -> Option<String> {
        self.active.read().as_deref().map(|s| s.name().to_string())
    }
}

impl<I, O> Default for StrategyContext<I, O> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard for the per-thread in-flight counter.
struct InFlightGuard<'a> {
    counters: &'a Mutex<HashMap<ThreadId, usize>>,
    thread: ThreadId,
}

impl<'a> InFlightGuard<'a> {
    fn enter(counters: &'a Mutex<HashMap<ThreadId, usize>>) -> Self {
        let thread = thread::current().id();
        *counters.lock().entry(thread).or_insert(0) += 1;
        Self { counters, thread }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut counters = self.counters.lock();
        if let Some(count) = counters.get_mut(&self.thread) {
            *count -= 1;
            if *count == 0 {
                counters.remove(&self.thread);
            }
        }
    }
}
