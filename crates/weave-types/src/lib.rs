//! # Weave Types Crate
//!
//! Shared contracts for the Weave composition engine. Every cross-crate
//! type lives here: the `Tag` discriminator, the `Operation` trait that
//! registries, chains, and strategies all speak, and the common error
//! taxonomy for wrapped operations.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate contracts are defined here and
//!   nowhere else.
//! - **Opaque passthrough**: failures raised by externally-supplied code
//!   (constructors, strategies, wrapped operations, subscribers) travel as
//!   `BoxError` and are never reinterpreted by the engine.
//! - **Narrow capabilities**: one operation signature per role. A component
//!   implements only the roles it needs.

pub mod contract;
pub mod tag;

pub use contract::{BoxError, FnOperation, Operation, OperationError};
pub use tag::Tag;
