//! # Decorator Chain - Layered Cross-Cutting Behavior
//!
//! An ordered stack of behavior layers wrapping a base operation. A chain
//! is built outer-to-inner, is immutable once built, and invocation passes
//! through layers in build order and returns back out in reverse order
//! (around-advice semantics).
//!
//! ## Layers
//!
//! | Layer | Behavior |
//! |-------|----------|
//! | `CacheLayer` | Time-bounded memoization of successful results |
//! | `InstrumentLayer` | Tracing around every call (outcome, elapsed) |
//! | `RetryLayer` | Bounded re-invocation on inner failures |
//! | `TimeoutLayer` | Races the inner chain against a deadline |
//! | `RateLimitLayer` | Token-bucket admission control |
//!
//! Any type implementing [`Layer`] composes the same way.
//!
//! ## Ordering Contract
//!
//! The builder does not enforce an order; composition order is the caller's
//! contract:
//!
//! - Layers that must see every call (instrumentation, metrics) go
//!   **outside** the cache - a cache hit suppresses the inner chain, and
//!   layers below the cache will not see suppressed calls.
//! - Layers that should benefit from caching (expensive checks) go
//!   **inside** it.
//! - A `TimeoutLayer` composes on either side of the cache; the
//!   cancellation scope in [`cancel`] keeps a timed-out call from
//!   populating a cache entry the caller never received.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use weave_chain::{ChainBuilder, InstrumentLayer};
//! use weave_types::FnOperation;
//!
//! let chain = ChainBuilder::<u32, u32>::new()
//!     .layer(Arc::new(InstrumentLayer::new("lookup")))
//!     .build(Arc::new(FnOperation::new(|x: u32| Ok(x + 1))));
//!
//! assert_eq!(chain.invoke(41).unwrap(), 42);
//! assert_eq!(chain.layer_names(), vec!["instrument"]);
//! ```

pub mod cache;
pub mod cancel;
pub mod chain;
pub mod instrument;
pub mod rate_limit;
pub mod retry;
pub mod timeout;

pub use cache::{CacheConfig, CacheLayer, CacheStats};
pub use cancel::CancelToken;
pub use chain::{ChainBuilder, DecoratorChain, Layer, Next};
pub use instrument::InstrumentLayer;
pub use rate_limit::RateLimitLayer;
pub use retry::RetryLayer;
pub use timeout::TimeoutLayer;
