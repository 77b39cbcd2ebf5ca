//! # Pat Client Service
//!
//! The facade composing the [`Registry`](crate::domain::Registry) with a
//! [`Transport`](crate::ports::Transport), implementing the `PubSubApi` port.
//!
//! - `connect` opens the transport with a dispatch bridge and subscribes every
//!   channel already owned by a registered listener.
//! - `register`, `unregister` and `subscribe_callback` forward to the registry
//!   and, while connected, apply the resulting subscribe/unsubscribe delta.
//! - Outbound payloads are compressed, inbound payloads decompressed, when
//!   compression is configured.

mod api;
mod client;

pub use client::{ConnectionState, PatClient};
