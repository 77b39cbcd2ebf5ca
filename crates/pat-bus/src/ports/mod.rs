//! # Ports Layer
//!
//! Hexagonal architecture ports for the dispatch layer.
//!
//! - **Driving Port (Inbound)**: [`PubSubApi`], the application-facing surface.
//! - **Driven Port (Outbound)**: [`Transport`], the broker connection.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
