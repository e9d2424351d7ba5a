//! # Timeout Layer
//!
//! Races the inner chain against a deadline. The inner chain runs on a
//! worker thread inside a cancellation scope; if the deadline expires
//! first, the caller gets `OperationError::Timeout`, the scope's token is
//! cancelled, and the abandoned call's eventual result is discarded.
//!
//! A cache layer **inside** this one checks the scope before storing, so a
//! timed-out call does not populate an entry the caller never received
//! (the store and the deadline can still race at the exact boundary;
//! cancellation closes the window where a store lands after the deadline
//! has passed). A cache layer **outside** this one needs no protection:
//! it sees the `Timeout` error and failures are never cached.
//!
//! The worker thread is detached. A wrapped operation that blocks forever
//! leaks its thread; this layer bounds the caller's wait, not the inner
//! call's lifetime.

use crate::cancel::CancelToken;
use crate::chain::{Layer, Next};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::warn;
use weave_types::OperationError;

/// Decorator layer bounding the caller's wait on the inner chain.
pub struct TimeoutLayer {
    deadline: Duration,
}

impl TimeoutLayer {
    /// Create a timeout layer with the given deadline.
    #[must_use]
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }
}

impl<I, O> Layer<I, O> for TimeoutLayer
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn name(&self) -> &str {
        "timeout"
    }

    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError> {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let (sender, receiver) = mpsc::sync_channel(1);
        let start = Instant::now();

        let spawned = std::thread::Builder::new()
            .name("weave-timeout".into())
            .spawn(move || {
                let _scope = worker_token.enter();
                let _ = sender.send(next.invoke(input));
            });
        if let Err(error) = spawned {
            return Err(OperationError::inner(error));
        }

        match receiver.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                token.cancel();
                warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "Operation timed out, abandoning call"
                );
                Err(OperationError::Timeout {
                    elapsed: start.elapsed(),
                    deadline: self.deadline,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(OperationError::inner(
                "inner operation worker terminated without a result",
            )),
        }
    }
}
