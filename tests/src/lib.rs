//! # Pat Test Suite
//!
//! Unified test crate exercising `pat-bus` end to end against the in-memory
//! broker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs          # Listeners, clients and wait helpers
//! └── integration/
//!     ├── scenarios.rs     # Register / publish / unregister walkthroughs
//!     ├── properties.rs    # Ownership, completeness, isolation, idempotence
//!     ├── concurrency.rs   # Registration and dispatch under contention
//!     └── compression.rs   # Compressed payloads between clients
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p pat-tests
//!
//! # By category
//! cargo test -p pat-tests integration::scenarios
//! cargo test -p pat-tests integration::concurrency
//! ```

#![allow(dead_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
