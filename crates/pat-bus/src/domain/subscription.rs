//! # Subscription
//!
//! One channel-bound invocation target. Two variants share the single
//! [`Subscription::handle`] contract:
//!
//! - [`Subscription::Method`]: a method declared by the listener's
//!   [`Listener::bind`](super::listener::Listener::bind) table.
//! - [`Subscription::Callback`]: a closure attached later through
//!   `subscribe_callback`, whose lifetime is tied to the owning listener.
//!
//! Every failure, returned error or panic, is wrapped into an
//! [`InvocationError`] labelled with channel, listener type and handler name.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::errors::{BoxError, HandlerPanic, InvocationError, RegistrationError};
use super::event::Event;
use super::listener::{BoundMethod, Listener};

/// Type-erased listener instance, as held by a handler group.
pub type ListenerRef = Arc<dyn Any + Send + Sync>;

/// Callback signature accepted by `subscribe_callback`.
pub type Callback = Arc<dyn Fn(&Event) -> Result<(), BoxError> + Send + Sync>;

type ErasedMethod = Arc<dyn Fn(&(dyn Any + Send + Sync), &Event) -> Result<(), BoxError> + Send + Sync>;

/// Handler name reported for callback subscriptions.
pub const CALLBACK_HANDLER: &str = "callback";

/// A subscription bound to a listener method.
#[derive(Clone)]
pub struct MethodSubscription {
    listener_type: &'static str,
    handler: &'static str,
    method: ErasedMethod,
}

impl MethodSubscription {
    /// Validates the channel and erases the listener type of `method`.
    pub(crate) fn new<L: Listener>(
        channel: &str,
        handler: &'static str,
        method: BoundMethod<L>,
    ) -> Result<Self, RegistrationError> {
        let listener_type = std::any::type_name::<L>();
        validate_channel(channel, listener_type)?;

        let method: ErasedMethod = Arc::new(
            move |listener: &(dyn Any + Send + Sync), event: &Event| match listener.downcast_ref::<L>() {
                Some(listener) => method(listener, event),
                None => Err(format!("listener is not a {}", std::any::type_name::<L>()).into()),
            },
        );

        Ok(Self {
            listener_type,
            handler,
            method,
        })
    }
}

/// A subscription bound to a caller-supplied closure.
#[derive(Clone)]
pub struct CallbackSubscription {
    listener_type: &'static str,
    callback: Callback,
}

impl CallbackSubscription {
    pub(crate) fn new(listener_type: &'static str, callback: Callback) -> Self {
        Self {
            listener_type,
            callback,
        }
    }
}

/// A channel-bound invocation target.
#[derive(Clone)]
pub enum Subscription {
    Method(MethodSubscription),
    Callback(CallbackSubscription),
}

impl Subscription {
    /// Invokes the target with `event`, isolating panics.
    pub fn handle(
        &self,
        listener: &(dyn Any + Send + Sync),
        event: &Event,
    ) -> Result<(), InvocationError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match self {
            Self::Method(sub) => (sub.method)(listener, event),
            Self::Callback(sub) => (sub.callback)(event),
        }));

        let cause: BoxError = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(cause)) => cause,
            Err(payload) => Box::new(HandlerPanic::from_payload(payload.as_ref())),
        };

        Err(InvocationError {
            channel: event.channel().to_string(),
            listener: self.listener_type(),
            handler: self.handler(),
            cause,
        })
    }

    /// Type name of the owning listener.
    pub fn listener_type(&self) -> &'static str {
        match self {
            Self::Method(sub) => sub.listener_type,
            Self::Callback(sub) => sub.listener_type,
        }
    }

    /// Handler method name, or [`CALLBACK_HANDLER`].
    pub fn handler(&self) -> &'static str {
        match self {
            Self::Method(sub) => sub.handler,
            Self::Callback(_) => CALLBACK_HANDLER,
        }
    }

    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener_type())
            .field("handler", &self.handler())
            .finish()
    }
}

/// Rejects channel names that cannot be subscribed on a broker.
pub(crate) fn validate_channel(channel: &str, listener: &'static str) -> Result<(), RegistrationError> {
    if channel.is_empty() || channel.chars().any(|c| c.is_whitespace() || c == '\0') {
        return Err(RegistrationError::InvalidChannel {
            channel: channel.to_string(),
            listener,
        });
    }
    Ok(())
}
