//! Cross-crate integration tests.

pub mod concurrency;
