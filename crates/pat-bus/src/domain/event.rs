//! # Event
//!
//! Immutable record handed to every subscription of a channel: the channel
//! name and the opaque payload bytes, exactly as delivered by the transport
//! (after optional decompression).
//!
//! Format-specific decoding is best effort and belongs to the handler; the
//! helpers below never fail loudly, they return `None` instead.

use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;

/// A message received on a channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Event {
    channel: String,
    payload: Vec<u8>,
}

impl Event {
    /// Creates an event. Only the dispatch path builds events from
    /// transport-delivered data; tests and adapters may build them directly.
    pub fn new(channel: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }

    /// The channel the message was published on.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// The raw payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload decoded as UTF-8, replacing invalid sequences.
    pub fn payload_as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }

    /// The payload as UTF-8, or `None` if it is not valid UTF-8.
    pub fn payload_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }

    /// Parses the payload as a JSON document.
    pub fn as_json(&self) -> Option<serde_json::Value> {
        self.decode_json()
    }

    /// Deserializes the payload from JSON into `T`.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.payload).ok()
    }

    /// Decodes the payload as a protocol buffer message.
    #[cfg(feature = "protobuf")]
    pub fn decode_protobuf<M: prost::Message + Default>(&self) -> Option<M> {
        M::decode(self.payload.as_slice()).ok()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("channel", &self.channel)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}
