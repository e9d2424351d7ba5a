//! # Registry - Creation Authority for Tagged Variants
//!
//! Maps a [`Tag`](weave_types::Tag) to a constructor function and resolves
//! tags to concrete instances. This is the factory half of the engine:
//! call sites name a variant, never a concrete type.
//!
//! ## Rules
//!
//! - Duplicate registration is a checked error, never a silent replace.
//! - Resolution of an unregistered tag is a checked error, never a fallback
//!   instance. Missing registrations fail loud.
//! - Constructor failures propagate to the caller unchanged.
//!
//! ## Usage
//!
//! ```rust
//! use weave_registry::Registry;
//! use weave_types::Tag;
//!
//! let registry: Registry<&str, String> = Registry::new();
//! registry
//!     .register("greeting", |name: &str| Ok(format!("hello, {name}")))
//!     .unwrap();
//!
//! let out = registry.resolve(&Tag::new("greeting"), "weave").unwrap();
//! assert_eq!(out, "hello, weave");
//! ```

pub mod errors;
pub mod registry;

pub use errors::RegistryError;
pub use registry::{Constructor, Registry};
