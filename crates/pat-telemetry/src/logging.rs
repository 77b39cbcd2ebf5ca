//! Structured logging over `tracing-subscriber`.
//!
//! Human-readable output by default, one JSON object per line when
//! `json_logs` is set. Every line carries the target and thread name, so
//! dispatch on a transport delivery thread is distinguishable from
//! application calls.

use tracing_subscriber::EnvFilter;

use crate::{TelemetryConfig, TelemetryError};

/// Handle returned by [`init_logging`]; hold it for the lifetime of the process.
#[derive(Debug)]
pub struct LoggingGuard {
    service_name: String,
}

impl LoggingGuard {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down logging");
    }
}

/// Installs the global subscriber described by `config`.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] if a global subscriber
/// is already set, and with [`TelemetryError::Config`] on an invalid filter.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    let filter = build_filter(config)?;

    let installed = if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_names(true)
            .try_init()
    };
    installed.map_err(|_| TelemetryError::AlreadyInitialized)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        service_name: config.service_name.clone(),
    })
}

/// Best-effort subscriber for tests: captured by the test harness, ignored
/// if one is already installed. Honours `RUST_LOG`, defaulting to `debug`.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if !config.console_output {
        return Ok(EnvFilter::new("off"));
    }
    EnvFilter::try_new(&config.log_level).map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Log a channel-related event with standard fields.
///
/// ```rust,ignore
/// log_channel_event!(info, "orders", "Listener attached", listener = "Orders");
/// ```
#[macro_export]
macro_rules! log_channel_event {
    ($level:ident, $channel:expr, $msg:expr $(, $($field:tt)*)?) => {
        $crate::tracing::$level!(
            channel = %$channel,
            $($($field)*,)?
            $msg
        )
    };
}
