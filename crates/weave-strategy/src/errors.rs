//! # Strategy Error Types

use thiserror::Error;
use weave_types::BoxError;

/// Errors from strategy-context operations.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// No strategy has ever been assigned to this context.
    #[error("no strategy assigned to this context")]
    NotSet,

    /// `set_strategy` was called from within `invoke` on the same thread.
    /// The active pointer is left unchanged.
    #[error("reentrant swap: set_strategy called from within invoke on the same thread")]
    ReentrantSwap,

    /// The active strategy failed. Opaque passthrough of its error.
    #[error("strategy '{strategy}' failed: {source}")]
    Execution {
        strategy: String,
        #[source]
        source: BoxError,
    },
}
