//! # Pat Bus - Channel Dispatch over a Pub/Sub Connection
//!
//! Lets application code declare interest in named channels, routes inbound
//! messages from a broker connection to exactly the interested handlers, and
//! publishes outbound messages over the same connection.
//!
//! ## Dispatch Flow
//!
//! ```text
//!  Transport ──(channel, bytes)──→ [decompress] ──→ Event
//!                                                    │
//!                                                    ↓
//!                                  Registry: channel → owning HandlerGroup
//!                                                    │
//!                                 ┌──────────────────┼──────────────────┐
//!                                 ↓                  ↓                  ↓
//!                            method sub         method sub          callback
//!                          (isolated: errors and panics are logged, never propagated)
//! ```
//!
//! ## Guarantees
//!
//! - **Single ownership:** a channel belongs to at most one registered listener;
//!   a conflicting registration fails and has no effect.
//! - **Exact fan-out:** an event invokes every subscription on its channel once,
//!   in registration order.
//! - **Isolation:** a failing handler never prevents delivery to the others.
//! - **Clean removal:** unregistering releases only the listener's own channels.
//!
//! ## Example
//!
//! ```ignore
//! use pat_bus::{listener, Event, MemoryBroker, PatBuilder, PubSubApi};
//!
//! struct Orders;
//!
//! impl Orders {
//!     fn on_order(&self, event: &Event) {
//!         println!("order: {}", event.payload_as_text());
//!     }
//! }
//!
//! listener!(Orders { "orders" => on_order });
//!
//! let broker = MemoryBroker::new();
//! let client = PatBuilder::new(broker.connection()).build()?;
//! client.register(&Arc::new(Orders))?;
//! client.connect()?;
//! client.send("orders", "hello")?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{MemoryBroker, MemoryTransport};
pub use codec::{CodecError, NoOpCompressor, PayloadCompressor};
pub use config::{ClientConfig, CompressionConfig, PatBuilder, DEFAULT_COMPRESSION_LEVEL};
pub use domain::{
    Binder, BoxError, Callback, ChannelDelta, DispatchReport, Event, HandlerGroup, HandlerOutcome,
    HandlerPanic, InvocationError, Listener, ListenerId, RegistrationError, Registry, Subscription,
};
pub use error::{PatError, PatResult};
pub use ports::{InboundHandler, PendingDelivery, PubSubApi, Transport, TransportError};
pub use service::{ConnectionState, PatClient};

#[cfg(feature = "compression")]
pub use codec::ZstdCompressor;
