//! # Adapters Layer
//!
//! Implementations of the outbound ports.

pub mod memory;

pub use memory::{MemoryBroker, MemoryTransport};
