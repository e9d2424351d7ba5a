//! # Weave Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-crate flows and concurrency hammers
//!     ├── engine_flow.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p weave-tests
//!
//! # By category
//! cargo test -p weave-tests integration::
//!
//! # Benchmarks
//! cargo bench -p weave-tests
//! ```

#![allow(dead_code)]

pub mod integration;

/// Initialize test logging once. Honors `RUST_LOG`; silent by default.
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
