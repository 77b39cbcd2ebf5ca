//! Error types for the client facade.

use thiserror::Error;

use crate::codec::CodecError;
use crate::domain::RegistrationError;
use crate::ports::TransportError;

/// Client facade errors
#[derive(Debug, Error)]
pub enum PatError {
    /// Listener registration was rejected; nothing was registered
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The transport failed; passed through unchanged
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload compression failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Operation requires an open connection
    #[error("Client is not connected")]
    NotConnected,

    /// The client has been shut down
    #[error("Client has been shut down")]
    ShutDown,

    /// Payload serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for facade operations
pub type PatResult<T> = Result<T, PatError>;
