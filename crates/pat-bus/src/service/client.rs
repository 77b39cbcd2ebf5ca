use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::codec::{compressor_for, PayloadCompressor};
use crate::config::{ClientConfig, PatBuilder};
use crate::domain::{ChannelDelta, Event, HandlerGroup, Listener, ListenerId, Registry};
use crate::error::PatError;
use crate::ports::{InboundHandler, PubSubApi, Transport};

/// Lifecycle of a [`PatClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    /// Terminal; the transport has been released.
    ShutDown,
}

pub(super) struct Session {
    pub(super) state: ConnectionState,
    /// Cleared on disconnect so queued inbound messages are not dispatched.
    pub(super) attached: Option<Arc<AtomicBool>>,
}

/// Pub/sub client: listener registry plus a transport connection.
pub struct PatClient {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) registry: Arc<Registry>,
    pub(super) compressor: Arc<dyn PayloadCompressor>,
    pub(super) config: ClientConfig,
    pub(super) session: Mutex<Session>,
    /// Serializes registry mutations with their transport side effects.
    /// Taken before `session` whenever both are needed.
    pub(super) gate: Mutex<()>,
}

impl PatClient {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Result<Self, PatError> {
        let compressor = compressor_for(&config.compression)
            .map_err(|e| PatError::Config(e.to_string()))?;

        debug!(
            client = %config.client_name,
            compression = compressor.name(),
            "Client created"
        );

        Ok(Self {
            transport,
            registry: Arc::new(Registry::new()),
            compressor,
            config,
            session: Mutex::new(Session {
                state: ConnectionState::Disconnected,
                attached: None,
            }),
            gate: Mutex::new(()),
        })
    }

    /// Starts building a client over `transport`.
    pub fn builder<T: Transport>(transport: T) -> PatBuilder {
        PatBuilder::new(transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.session.lock().state
    }

    /// The listener registry backing this client.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Channels owned by registered listeners, sorted.
    pub fn registered_channels(&self) -> Vec<String> {
        self.registry.channels()
    }

    pub fn is_registered<L: Listener>(&self, listener: &Arc<L>) -> bool {
        self.registry.is_registered(ListenerId::of(listener))
    }

    /// Serializes `value` as JSON and publishes it.
    pub fn send_json<T: Serialize + ?Sized>(&self, channel: &str, value: &T) -> Result<usize, PatError> {
        let payload = serde_json::to_vec(value)?;
        self.send(channel, payload)
    }

    /// Encodes `message` as a protocol buffer and publishes it.
    #[cfg(feature = "protobuf")]
    pub fn send_message<M: prost::Message>(&self, channel: &str, message: &M) -> Result<usize, PatError> {
        self.send(channel, message.encode_to_vec())
    }

    // =========================================================================
    // Internals shared with the PubSubApi impl
    // =========================================================================

    /// Compressed payload ready for the transport, if the client may publish.
    pub(super) fn outbound(&self, payload: &[u8]) -> Result<Vec<u8>, PatError> {
        match self.session.lock().state {
            ConnectionState::Connected => {}
            ConnectionState::Disconnected => return Err(PatError::NotConnected),
            ConnectionState::ShutDown => return Err(PatError::ShutDown),
        }
        Ok(self.compressor.compress(payload)?)
    }

    pub(super) fn lock_gate(&self) -> Result<MutexGuard<'_, ()>, PatError> {
        let gate = self.gate.lock();
        if self.session.lock().state == ConnectionState::ShutDown {
            return Err(PatError::ShutDown);
        }
        Ok(gate)
    }

    pub(super) fn is_live(&self) -> bool {
        self.session.lock().state == ConnectionState::Connected
    }

    /// Subscribes the transport to `channels`. On failure the channels
    /// subscribed so far are released again and the error returned.
    pub(super) fn subscribe_all(&self, channels: &[String]) -> Result<(), PatError> {
        for (done, channel) in channels.iter().enumerate() {
            if let Err(e) = self.transport.subscribe(channel) {
                warn!(channel = %channel, error = %e, "Transport subscribe failed");
                for subscribed in &channels[..done] {
                    if let Err(e) = self.transport.unsubscribe(subscribed) {
                        warn!(channel = %subscribed, error = %e, "Transport unsubscribe failed during rollback");
                    }
                }
                return Err(e.into());
            }
            debug!(channel = %channel, "Transport subscribed");
        }
        Ok(())
    }

    /// Unsubscribes every channel, returning the first error after trying all.
    pub(super) fn unsubscribe_all(&self, channels: &[String]) -> Result<(), PatError> {
        let mut first_error = None;
        for channel in channels {
            match self.transport.unsubscribe(channel) {
                Ok(()) => debug!(channel = %channel, "Transport unsubscribed"),
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Transport unsubscribe failed");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    /// Applies a registry delta for `id`; restores `previous` if subscribing fails.
    ///
    /// Once the subscribes succeed the new group stands. Channels that fail to
    /// unsubscribe are logged and left to deliver into an unmatched dispatch.
    pub(super) fn apply_delta(
        &self,
        id: ListenerId,
        previous: Option<Arc<HandlerGroup>>,
        delta: &ChannelDelta,
    ) -> Result<(), PatError> {
        if delta.is_empty() || !self.is_live() {
            return Ok(());
        }
        if let Err(e) = self.subscribe_all(&delta.subscribe) {
            self.registry.restore(id, previous);
            return Err(e);
        }
        if let Err(e) = self.unsubscribe_all(&delta.unsubscribe) {
            warn!(listener = %id, error = %e, "Registration kept despite stale transport subscriptions");
        }
        Ok(())
    }

    /// Transport inbound notification → registry dispatch.
    pub(super) fn bridge(&self, attached: Arc<AtomicBool>) -> InboundHandler {
        let registry = Arc::clone(&self.registry);
        let compressor = Arc::clone(&self.compressor);

        Arc::new(move |channel: &str, payload: &[u8]| {
            if !attached.load(Ordering::Acquire) {
                trace!(channel = %channel, "Bridge detached, message ignored");
                return;
            }
            let payload = match compressor.decompress(payload) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(channel = %channel, error = %e, "Dropping undecodable payload");
                    return;
                }
            };
            registry.dispatch(&Event::new(channel, payload));
        })
    }
}

impl fmt::Debug for PatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatClient")
            .field("client_name", &self.config.client_name)
            .field("state", &self.state())
            .field("compression", &self.compressor.name())
            .field("listeners", &self.registry.len())
            .finish()
    }
}
