//! # Domain Errors
//!
//! Error taxonomy for registration and handler invocation.
//!
//! - [`RegistrationError`]: raised synchronously from `register`; the
//!   registration has no effect when it occurs.
//! - [`InvocationError`]: a handler failed while processing an event. Caught
//!   per subscription during dispatch, logged, never propagated.

use thiserror::Error;

/// Boxed error carried as the cause of a handler failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while registering a listener or attaching a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The channel is already owned by a different registered listener.
    #[error("Duplicate subscription for channel '{channel}' in listener '{listener}'")]
    DuplicateSubscription {
        channel: String,
        listener: &'static str,
    },

    /// One listener declared the same channel on two of its own handlers.
    #[error("Channel '{channel}' is declared more than once by listener '{listener}'")]
    DuplicateChannelInListener {
        channel: String,
        listener: &'static str,
    },

    /// The channel name cannot be bound to a handler.
    #[error("Invalid channel name {channel:?} for a handler of listener '{listener}'")]
    InvalidChannel {
        channel: String,
        listener: &'static str,
    },
}

impl RegistrationError {
    /// The channel the error refers to.
    pub fn channel(&self) -> &str {
        match self {
            Self::DuplicateSubscription { channel, .. }
            | Self::DuplicateChannelInListener { channel, .. }
            | Self::InvalidChannel { channel, .. } => channel,
        }
    }
}

/// A handler (method or callback) failed while processing an event.
#[derive(Debug, Error)]
#[error("Error invoking handler {handler} for channel '{channel}' on listener '{listener}'")]
pub struct InvocationError {
    /// Channel of the event being handled.
    pub channel: String,
    /// Type name of the listener owning the subscription.
    pub listener: &'static str,
    /// Handler method name, or `callback`.
    pub handler: &'static str,
    /// Underlying failure.
    #[source]
    pub cause: BoxError,
}

/// Cause attached to an [`InvocationError`] when the handler panicked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    pub message: String,
}

impl HandlerPanic {
    /// Extracts a readable message from a panic payload.
    pub(crate) fn from_payload(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}
