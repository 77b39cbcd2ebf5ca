//! # Outbound Ports (Driven Ports)
//!
//! The broker connection the dispatch layer depends on. The core only needs
//! channel subscription, publication and one inbound notification shape;
//! connection management, framing and reconnect policy stay behind this trait.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::{self, BoxFuture, FutureExt};
use thiserror::Error;

/// Inbound notification: called once per received message with
/// `(channel, payload)`.
pub type InboundHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// Errors surfaced by a transport. Passed through unchanged, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is not open.
    #[error("Transport is not connected")]
    NotConnected,

    /// The transport has been released and cannot be used again.
    #[error("Transport is closed")]
    Closed,

    /// The broker refused the operation.
    #[error("Operation rejected by broker: {reason}")]
    Rejected { reason: String },

    /// The message could not be delivered.
    #[error("Delivery failed: {reason}")]
    Delivery { reason: String },
}

/// Abstract interface for a pub/sub broker connection.
///
/// All methods are synchronous except [`Transport::publish_async`]; none of
/// them may call back into the inbound handler on the calling thread.
pub trait Transport: Send + Sync + 'static {
    /// Opens the connection and routes inbound messages to `handler`.
    fn open(&self, handler: InboundHandler) -> Result<(), TransportError>;

    /// Closes the connection. Inbound delivery stops.
    fn close(&self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    /// Starts receiving messages published on `channel`.
    fn subscribe(&self, channel: &str) -> Result<(), TransportError>;

    /// Stops receiving messages published on `channel`.
    fn unsubscribe(&self, channel: &str) -> Result<(), TransportError>;

    /// Publishes and returns the number of subscribers that received the message.
    fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<usize, TransportError>;

    /// Publishes without blocking the caller.
    fn publish_async(&self, channel: &str, payload: Vec<u8>) -> PendingDelivery;

    /// Releases every resource held by the transport. Terminal.
    fn release(&self) -> Result<(), TransportError>;
}

/// Pending result of an asynchronous publish: the delivery count.
#[must_use = "futures do nothing unless polled"]
pub struct PendingDelivery {
    inner: BoxFuture<'static, Result<usize, TransportError>>,
}

impl PendingDelivery {
    /// Wraps any future producing a delivery result.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Result<usize, TransportError>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    /// An already completed delivery.
    pub fn ready(result: Result<usize, TransportError>) -> Self {
        Self::new(future::ready(result))
    }

    pub fn failed(error: TransportError) -> Self {
        Self::ready(Err(error))
    }
}

impl Future for PendingDelivery {
    type Output = Result<usize, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for PendingDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingDelivery").finish_non_exhaustive()
    }
}
