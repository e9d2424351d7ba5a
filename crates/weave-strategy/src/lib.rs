//! # Strategy Context - Swappable Algorithms per Role
//!
//! Holds the single currently-active algorithm for a role and supports
//! atomic hot-swap: a concurrent invoke either completely uses the old
//! strategy or completely uses the new one, never a mix.
//!
//! ## Invariants
//!
//! - Exactly one active strategy at any instant (or none, before the first
//!   assignment - invoking then is a checked `NotSet` error).
//! - Swap is a single pointer replacement under a write lock; invokes clone
//!   the active pointer under the read lock and execute outside it.
//! - `set_strategy` called from within `invoke` on the same thread is
//!   rejected with `ReentrantSwap`. Cross-thread swap during another
//!   thread's invoke is the supported hot-swap path.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use weave_strategy::{FnStrategy, StrategyContext};
//!
//! let context: StrategyContext<u32, u32> = StrategyContext::new();
//! context
//!     .set_strategy(Arc::new(FnStrategy::new("double", |n: u32| Ok(n * 2))))
//!     .unwrap();
//! assert_eq!(context.invoke(21).unwrap(), 42);
//! ```

pub mod context;
pub mod errors;

pub use context::{FnStrategy, Strategy, StrategyContext};
pub use errors::StrategyError;
