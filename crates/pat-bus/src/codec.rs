//! # Payload Compression
//!
//! Optional Zstd compression of message payloads.
//!
//! - **Write Path**: `zstd::encode_all(payload, level)` before publishing
//! - **Read Path**: `zstd::decode_all(payload)` before the event is built
//!
//! Every client on a channel must agree on the codec; the broker sees only
//! opaque bytes.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::config::CompressionConfig;

// =============================================================================
// CODEC ERROR
// =============================================================================

/// Errors during payload compression or decompression.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Payload compression failed: {0}")]
    Compress(#[source] io::Error),

    #[error("Payload decompression failed: {0}")]
    Decompress(#[source] io::Error),

    /// Compression was requested but the `compression` feature is off.
    #[error("Compression requested but the `compression` feature is not enabled")]
    Disabled,
}

// =============================================================================
// COMPRESSOR TRAIT
// =============================================================================

/// Transformation applied to payloads on their way to and from the broker.
pub trait PayloadCompressor: Send + Sync {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;

    fn is_enabled(&self) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the compressor described by `config`.
pub fn compressor_for(config: &CompressionConfig) -> Result<Arc<dyn PayloadCompressor>, CodecError> {
    if !config.enabled {
        return Ok(Arc::new(NoOpCompressor));
    }

    #[cfg(feature = "compression")]
    {
        Ok(Arc::new(ZstdCompressor::new(config.level)))
    }

    #[cfg(not(feature = "compression"))]
    {
        Err(CodecError::Disabled)
    }
}

// =============================================================================
// ZSTD COMPRESSOR
// =============================================================================

/// Zstd compressor at a fixed level.
#[cfg(feature = "compression")]
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

#[cfg(feature = "compression")]
impl ZstdCompressor {
    /// Levels outside 1-22 are clamped.
    pub fn new(level: i32) -> Self {
        Self {
            level: level.clamp(1, 22),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

#[cfg(feature = "compression")]
impl PayloadCompressor for ZstdCompressor {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::encode_all(payload, self.level).map_err(CodecError::Compress)
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(payload).map_err(CodecError::Decompress)
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "zstd"
    }
}

// =============================================================================
// NO-OP COMPRESSOR
// =============================================================================

/// Passes payloads through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCompressor;

impl PayloadCompressor for NoOpCompressor {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }

    fn is_enabled(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
