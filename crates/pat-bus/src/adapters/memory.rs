//! # In-Memory Broker
//!
//! An in-process pub/sub broker implementing the [`Transport`] port, for
//! tests and single-process deployments.
//!
//! Semantics follow a Redis pub/sub server:
//!
//! - `publish` returns the number of open connections subscribed to the
//!   channel at publish time.
//! - Messages published before a connection subscribes are not delivered to it.
//! - Subscriptions belong to a connection and are dropped when it closes.
//! - Each open connection delivers on its own named thread, in publish order.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::ports::{InboundHandler, PendingDelivery, Transport, TransportError};

struct Delivery {
    channel: String,
    payload: Arc<[u8]>,
}

#[derive(Default)]
struct BrokerState {
    /// Subscribed connections per channel.
    channels: HashMap<String, HashSet<Uuid>>,
    /// Delivery queue of every open connection.
    connections: HashMap<Uuid, mpsc::UnboundedSender<Delivery>>,
}

#[derive(Default)]
struct BrokerInner {
    state: Mutex<BrokerState>,
    published: AtomicU64,
}

/// Shared in-process broker. Clones refer to the same broker.
#[derive(Clone, Default)]
pub struct MemoryBroker {
    inner: Arc<BrokerInner>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, not yet opened, connection to this broker.
    pub fn connection(&self) -> MemoryTransport {
        self.named_connection("pat-memory")
    }

    /// Like [`connection`](Self::connection); `name` prefixes the delivery thread.
    pub fn named_connection(&self, name: impl Into<String>) -> MemoryTransport {
        MemoryTransport {
            broker: self.clone(),
            id: Uuid::new_v4(),
            name: name.into(),
            state: Mutex::new(ConnectionState::Idle),
        }
    }

    /// Publishes from outside any connection (e.g. a test driver).
    pub fn publish(&self, channel: &str, payload: impl Into<Vec<u8>>) -> usize {
        self.deliver(channel, Arc::from(payload.into()))
    }

    /// Number of open connections subscribed to `channel`.
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .state
            .lock()
            .channels
            .get(channel)
            .map_or(0, HashSet::len)
    }

    /// Channels with at least one subscriber, sorted.
    pub fn active_channels(&self) -> Vec<String> {
        let state = self.inner.state.lock();
        let mut channels: Vec<String> = state
            .channels
            .iter()
            .filter(|(_, subscribers)| !subscribers.is_empty())
            .map(|(channel, _)| channel.clone())
            .collect();
        channels.sort();
        channels
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.inner.state.lock().connections.len()
    }

    /// Total messages published since creation.
    pub fn published_count(&self) -> u64 {
        self.inner.published.load(Ordering::Relaxed)
    }

    fn deliver(&self, channel: &str, payload: Arc<[u8]>) -> usize {
        self.inner.published.fetch_add(1, Ordering::Relaxed);
        let state = self.inner.state.lock();
        let Some(subscribers) = state.channels.get(channel) else {
            trace!(channel = %channel, "Published with no subscribers");
            return 0;
        };

        let delivered = subscribers
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|tx| {
                tx.send(Delivery {
                    channel: channel.to_string(),
                    payload: Arc::clone(&payload),
                })
                .is_ok()
            })
            .count();

        trace!(channel = %channel, delivered, "Published");
        delivered
    }

    fn attach(&self, id: Uuid, tx: mpsc::UnboundedSender<Delivery>) {
        self.inner.state.lock().connections.insert(id, tx);
    }

    fn detach(&self, id: Uuid) {
        let mut state = self.inner.state.lock();
        state.connections.remove(&id);
        state.channels.retain(|_, subscribers| {
            subscribers.remove(&id);
            !subscribers.is_empty()
        });
    }

    fn set_subscribed(&self, id: Uuid, channel: &str, subscribed: bool) {
        let mut state = self.inner.state.lock();
        if subscribed {
            state.channels.entry(channel.to_string()).or_default().insert(id);
        } else if let Some(subscribers) = state.channels.get_mut(channel) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                state.channels.remove(channel);
            }
        }
    }
}

enum ConnectionState {
    Idle,
    Open,
    Released,
}

/// One connection to a [`MemoryBroker`].
pub struct MemoryTransport {
    broker: MemoryBroker,
    id: Uuid,
    name: String,
    state: Mutex<ConnectionState>,
}

impl MemoryTransport {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn broker(&self) -> &MemoryBroker {
        &self.broker
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        match *self.state.lock() {
            ConnectionState::Open => Ok(()),
            ConnectionState::Idle => Err(TransportError::NotConnected),
            ConnectionState::Released => Err(TransportError::Closed),
        }
    }
}

impl Transport for MemoryTransport {
    fn open(&self, handler: InboundHandler) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        match *state {
            ConnectionState::Open => return Ok(()),
            ConnectionState::Released => return Err(TransportError::Closed),
            ConnectionState::Idle => {}
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        thread::Builder::new()
            .name(format!("{}-delivery", self.name))
            .spawn(move || {
                while let Some(delivery) = rx.blocking_recv() {
                    handler(&delivery.channel, &delivery.payload[..]);
                }
            })
            .map_err(|e| TransportError::Rejected {
                reason: format!("failed to spawn delivery thread: {e}"),
            })?;

        self.broker.attach(self.id, tx);
        *state = ConnectionState::Open;
        debug!(connection = %self.id, name = %self.name, "Memory connection opened");
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if matches!(*state, ConnectionState::Open) {
            // Dropping the sender ends the delivery thread once its queue drains.
            self.broker.detach(self.id);
            *state = ConnectionState::Idle;
            debug!(connection = %self.id, "Memory connection closed");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        matches!(*self.state.lock(), ConnectionState::Open)
    }

    fn subscribe(&self, channel: &str) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.broker.set_subscribed(self.id, channel, true);
        trace!(connection = %self.id, channel = %channel, "Subscribed");
        Ok(())
    }

    fn unsubscribe(&self, channel: &str) -> Result<(), TransportError> {
        self.ensure_open()?;
        self.broker.set_subscribed(self.id, channel, false);
        trace!(connection = %self.id, channel = %channel, "Unsubscribed");
        Ok(())
    }

    fn publish(&self, channel: &str, payload: Vec<u8>) -> Result<usize, TransportError> {
        self.ensure_open()?;
        Ok(self.broker.deliver(channel, Arc::from(payload)))
    }

    fn publish_async(&self, channel: &str, payload: Vec<u8>) -> PendingDelivery {
        PendingDelivery::ready(self.publish(channel, payload))
    }

    fn release(&self) -> Result<(), TransportError> {
        self.close()?;
        *self.state.lock() = ConnectionState::Released;
        debug!(connection = %self.id, "Memory connection released");
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.broker.detach(self.id);
    }
}
