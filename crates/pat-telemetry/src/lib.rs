//! # Pat Telemetry
//!
//! Logging setup for applications embedding a Pat client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pat_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PAT_SERVICE_NAME` | `pat` | Service name in logs |
//! | `PAT_LOG_LEVEL` | `info` | Log filter (falls back to `RUST_LOG`) |
//! | `PAT_JSON_LOGS` | `false` | JSON formatted logs |
//! | `PAT_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{init_logging, init_test_logging, LoggingGuard};

#[doc(hidden)]
pub use tracing;

use thiserror::Error;

/// Logging initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
