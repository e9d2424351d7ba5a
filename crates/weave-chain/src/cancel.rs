//! # Cancellation Scopes
//!
//! A `CancelToken` is a shared flag connecting a layer that abandons a call
//! (the timeout layer) to layers further in that must not commit side
//! effects for an abandoned call (the cache layer's store path).
//!
//! The timeout layer runs the inner chain on a worker thread inside a token
//! scope; when the caller gives up, it cancels the token, and any store the
//! worker attempts afterwards sees `current_cancelled()` and is skipped.
//! Scopes nest: a store is suppressed if *any* enclosing scope on the
//! current thread is cancelled.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

thread_local! {
    static SCOPES: RefCell<Vec<CancelToken>> = const { RefCell::new(Vec::new()) };
}

/// Shared cancellation flag for one abandonable call.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the call abandoned. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether this token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Enter a scope on the current thread. The scope ends when the
    /// returned guard is dropped.
    #[must_use]
    pub fn enter(&self) -> CancelScope {
        SCOPES.with(|scopes| scopes.borrow_mut().push(self.clone()));
        CancelScope { _private: () }
    }
}

/// True if any cancellation scope entered on the current thread has been
/// cancelled.
#[must_use]
pub fn current_cancelled() -> bool {
    SCOPES.with(|scopes| scopes.borrow().iter().any(CancelToken::is_cancelled))
}

/// RAII guard for one entered scope.
pub struct CancelScope {
    _private: (),
}

impl Drop for CancelScope {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}
