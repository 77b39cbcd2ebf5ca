//! # Inbound Ports (Driving Ports)
//!
//! The application-facing pub/sub surface.

use std::sync::Arc;

use crate::domain::{Event, HandlerOutcome, Listener, ListenerId};
use crate::error::PatError;
use crate::ports::outbound::PendingDelivery;

/// Primary API for registering listeners and publishing messages.
pub trait PubSubApi: Send + Sync {
    /// Opens the connection and subscribes every owned channel. Idempotent.
    fn connect(&self) -> Result<(), PatError>;

    /// Detaches dispatch and closes the connection. Idempotent.
    fn disconnect(&self) -> Result<(), PatError>;

    /// Disconnects and releases the transport. Terminal.
    fn shutdown(&self) -> Result<(), PatError>;

    fn is_connected(&self) -> bool;

    /// Registers `listener`'s declared handlers.
    fn register<L: Listener>(&self, listener: &Arc<L>) -> Result<ListenerId, PatError>;

    /// Removes every subscription owned by `listener`.
    fn unregister<L: Listener>(&self, listener: &Arc<L>) -> Result<(), PatError>;

    /// Attaches `callback` on `channel` to an already registered listener.
    fn subscribe_callback<L, F, O>(
        &self,
        listener: &Arc<L>,
        channel: &str,
        callback: F,
    ) -> Result<(), PatError>
    where
        L: Listener,
        F: Fn(&Event) -> O + Send + Sync + 'static,
        O: HandlerOutcome;

    /// Publishes and returns the number of receiving subscribers.
    fn send<P: AsRef<[u8]>>(&self, channel: &str, payload: P) -> Result<usize, PatError>;

    /// Publishes without waiting for the delivery count.
    fn send_async<P: AsRef<[u8]>>(&self, channel: &str, payload: P) -> Result<PendingDelivery, PatError>;
}
