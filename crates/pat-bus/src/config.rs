//! Client configuration and builder.

use std::env;
use std::sync::Arc;

use crate::error::PatError;
use crate::ports::Transport;
use crate::service::PatClient;

/// Default Zstd level.
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Payload compression settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    /// Compress outbound and decompress inbound payloads.
    pub enabled: bool,
    /// Zstd level (1-22). 1-3 = fast, 19-22 = max compression.
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl CompressionConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn zstd(level: i32) -> Self {
        Self {
            enabled: true,
            level,
        }
    }

    /// Parses a compression mode (`none` / `zstd`, case-insensitive) and an
    /// optional level. Absent values fall back to the defaults.
    pub fn parse(mode: Option<&str>, level: Option<&str>) -> Result<Self, PatError> {
        let level = match level.map(str::trim) {
            None | Some("") => DEFAULT_COMPRESSION_LEVEL,
            Some(raw) => raw
                .parse()
                .map_err(|_| PatError::Config(format!("invalid compression level: {raw:?}")))?,
        };

        match mode.map(str::trim) {
            None | Some("") => Ok(Self { enabled: false, level }),
            Some(mode) if mode.eq_ignore_ascii_case("none") => Ok(Self { enabled: false, level }),
            Some(mode) if mode.eq_ignore_ascii_case("zstd") => Ok(Self::zstd(level)),
            Some(other) => Err(PatError::Config(format!(
                "unknown compression mode: {other:?} (expected none or zstd)"
            ))),
        }
    }
}

/// Configuration for a [`PatClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Name reported in client log records.
    pub client_name: String,

    pub compression: CompressionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_name: "pat".to_string(),
            compression: CompressionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `PAT_CLIENT_NAME`: Client name (default: pat)
    /// - `PAT_COMPRESSION`: `none` or `zstd` (default: none)
    /// - `PAT_COMPRESSION_LEVEL`: Zstd level (default: 3)
    ///
    /// Unknown compression modes and unparsable levels are rejected.
    pub fn from_env() -> Result<Self, PatError> {
        let compression = CompressionConfig::parse(
            env::var("PAT_COMPRESSION").ok().as_deref(),
            env::var("PAT_COMPRESSION_LEVEL").ok().as_deref(),
        )?;

        Ok(Self {
            client_name: env::var("PAT_CLIENT_NAME").unwrap_or_else(|_| "pat".to_string()),
            compression,
        })
    }

    /// Create configuration for tests (no compression).
    pub fn for_testing() -> Self {
        Self {
            client_name: "pat-test".to_string(),
            compression: CompressionConfig::disabled(),
        }
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Builds a [`PatClient`] over a transport: defaults first, overrides second.
pub struct PatBuilder {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl PatBuilder {
    pub fn new<T: Transport>(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Uses a transport that is already shared.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.config.compression = compression;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.config.client_name = name.into();
        self
    }

    /// Builds the client. Fails if the configuration cannot be honoured,
    /// e.g. compression enabled without the `compression` feature.
    pub fn build(self) -> Result<PatClient, PatError> {
        if self.config.client_name.trim().is_empty() {
            return Err(PatError::Config("client name must not be empty".to_string()));
        }
        PatClient::new(self.transport, self.config)
    }
}
