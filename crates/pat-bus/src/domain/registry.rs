//! # Registry
//!
//! Maps listener identities to their [`HandlerGroup`] and maintains the
//! derived `channel → owners` index used for conflict detection and dispatch.
//!
//! ## Locking
//!
//! Both maps live behind one `RwLock`. Every mutation (register, unregister,
//! callback attach) checks and commits under a single write lock, so no other
//! mutation can interleave between the ownership check and the insert.
//! Groups are stored as `Arc<HandlerGroup>` and replaced whole, never edited in
//! place. Dispatch clones the matching `Arc`s under the read lock, releases
//! it, then invokes handlers from that snapshot; a slow handler therefore never
//! blocks registration.
//!
//! ## Ownership
//!
//! A channel is owned by at most one registered listener. Registering a
//! listener that declares a channel owned by a different listener fails
//! without side effects. Re-registering the same instance replaces its group.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, trace, warn};

use super::errors::RegistrationError;
use super::event::Event;
use super::handler_group::HandlerGroup;
use super::listener::ListenerId;
use super::subscription::{validate_channel, Callback, CallbackSubscription, Subscription};

/// Transport-level effect of a registry mutation.
///
/// `subscribe` lists channels that gained their first owner, `unsubscribe`
/// channels that lost their last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDelta {
    pub subscribe: Vec<String>,
    pub unsubscribe: Vec<String>,
}

impl ChannelDelta {
    pub fn is_empty(&self) -> bool {
        self.subscribe.is_empty() && self.unsubscribe.is_empty()
    }
}

/// Outcome of dispatching one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Groups owning the channel at dispatch time.
    pub owners: usize,
    /// Subscriptions invoked.
    pub invoked: usize,
    /// Subscriptions that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    pub fn is_unmatched(&self) -> bool {
        self.owners == 0
    }
}

#[derive(Default)]
struct RegistryState {
    groups: HashMap<ListenerId, Arc<HandlerGroup>>,
    /// Owners per channel, in registration order.
    index: HashMap<String, Vec<ListenerId>>,
}

impl RegistryState {
    /// First owner of `channel` other than `id`.
    fn foreign_owner(&self, channel: &str, id: ListenerId) -> Option<ListenerId> {
        self.index
            .get(channel)
            .and_then(|owners| owners.iter().copied().find(|owner| *owner != id))
    }

    fn is_owned(&self, channel: &str) -> bool {
        self.index.get(channel).is_some_and(|owners| !owners.is_empty())
    }

    fn add_owner(&mut self, channel: &str, id: ListenerId) {
        let owners = self.index.entry(channel.to_string()).or_default();
        if !owners.contains(&id) {
            owners.push(id);
        }
    }

    /// Removes `id` from `channel`; true if the channel lost its last owner.
    fn remove_owner(&mut self, channel: &str, id: ListenerId) -> bool {
        let Some(owners) = self.index.get_mut(channel) else {
            return false;
        };
        owners.retain(|owner| *owner != id);
        if owners.is_empty() {
            self.index.remove(channel);
            true
        } else {
            false
        }
    }
}

/// Concurrent listener registry and dispatch engine.
#[derive(Default)]
pub struct Registry {
    state: RwLock<RegistryState>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a listener's group.
    ///
    /// An empty group is not stored. Fails without side effects if any of the
    /// group's channels is owned by a different listener.
    pub fn register(&self, group: HandlerGroup) -> Result<ChannelDelta, RegistrationError> {
        if group.is_empty() {
            debug!(listener = group.listener_type(), "Listener declares no channels, not registered");
            return Ok(ChannelDelta::default());
        }

        let id = group.id();
        let mut state = self.state.write();

        for channel in group.channels() {
            if let Some(owner) = state.foreign_owner(channel, id) {
                debug!(
                    channel = %channel,
                    listener = group.listener_type(),
                    owner = %owner,
                    "Registration rejected: channel already owned"
                );
                return Err(RegistrationError::DuplicateSubscription {
                    channel: channel.to_string(),
                    listener: group.listener_type(),
                });
            }
        }

        let mut delta = ChannelDelta::default();

        if let Some(previous) = state.groups.get(&id).cloned() {
            for channel in previous.channels().filter(|c| !group.has_channel(c)) {
                if state.remove_owner(channel, id) {
                    delta.unsubscribe.push(channel.to_string());
                }
            }
        }

        for channel in group.channels() {
            if !state.is_owned(channel) {
                delta.subscribe.push(channel.to_string());
            }
            state.add_owner(channel, id);
        }

        debug!(
            listener = group.listener_type(),
            id = %id,
            channels = ?group.channels().collect::<Vec<_>>(),
            "Listener registered"
        );
        state.groups.insert(id, Arc::new(group));

        Ok(delta)
    }

    /// Removes a listener's group. Channels still claimed by another group are
    /// kept subscribed.
    pub fn unregister(&self, id: ListenerId) -> ChannelDelta {
        let mut state = self.state.write();
        let Some(group) = state.groups.remove(&id) else {
            return ChannelDelta::default();
        };

        let mut delta = ChannelDelta::default();
        for channel in group.channels() {
            if state.remove_owner(channel, id) {
                delta.unsubscribe.push(channel.to_string());
            }
        }

        debug!(
            listener = group.listener_type(),
            id = %id,
            released = ?delta.unsubscribe,
            "Listener unregistered"
        );
        delta
    }

    /// Appends a callback subscription on `channel` to a registered group.
    ///
    /// A no-op when `id` is not registered. Rejected when a different
    /// listener owns `channel`.
    pub fn subscribe_callback(
        &self,
        id: ListenerId,
        channel: &str,
        callback: Callback,
    ) -> Result<ChannelDelta, RegistrationError> {
        let mut state = self.state.write();
        let Some(current) = state.groups.get(&id).cloned() else {
            warn!(channel = %channel, id = %id, "Callback ignored: listener is not registered");
            return Ok(ChannelDelta::default());
        };
        let listener_type = current.listener_type();

        validate_channel(channel, listener_type)?;
        if state.foreign_owner(channel, id).is_some() {
            return Err(RegistrationError::DuplicateSubscription {
                channel: channel.to_string(),
                listener: listener_type,
            });
        }

        let mut delta = ChannelDelta::default();
        if !state.is_owned(channel) {
            delta.subscribe.push(channel.to_string());
        }

        let mut group = HandlerGroup::clone(&current);
        group.add_subscription(
            channel,
            Subscription::Callback(CallbackSubscription::new(listener_type, callback)),
        );
        state.add_owner(channel, id);
        state.groups.insert(id, Arc::new(group));

        debug!(channel = %channel, listener = listener_type, "Callback subscription attached");
        Ok(delta)
    }

    /// Puts back the group `id` had before a failed mutation (or removes it
    /// when there was none). The index is rebuilt for the affected channels.
    pub(crate) fn restore(&self, id: ListenerId, previous: Option<Arc<HandlerGroup>>) {
        let mut state = self.state.write();
        if let Some(current) = state.groups.remove(&id) {
            for channel in current.channels() {
                state.remove_owner(channel, id);
            }
        }
        if let Some(previous) = previous {
            for channel in previous.channels() {
                state.add_owner(channel, id);
            }
            state.groups.insert(id, previous);
        }
    }

    /// Delivers `event` to every subscription on its channel.
    ///
    /// Handler failures are logged and counted, never propagated.
    pub fn dispatch(&self, event: &Event) -> DispatchReport {
        let snapshot: Vec<Arc<HandlerGroup>> = {
            let state = self.state.read();
            state
                .index
                .get(event.channel())
                .map(|owners| {
                    owners
                        .iter()
                        .filter_map(|id| state.groups.get(id).cloned())
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut report = DispatchReport {
            owners: snapshot.len(),
            ..DispatchReport::default()
        };

        if snapshot.is_empty() {
            trace!(channel = %event.channel(), "No listener for channel");
            return report;
        }

        for group in &snapshot {
            let (invoked, failures) = group.handle(event);
            report.invoked += invoked;
            report.failed += failures.len();
            for failure in failures {
                error!(
                    channel = %failure.channel,
                    listener = failure.listener,
                    handler = failure.handler,
                    error = %failure.cause,
                    "{}",
                    failure
                );
            }
        }

        trace!(
            channel = %event.channel(),
            owners = report.owners,
            invoked = report.invoked,
            failed = report.failed,
            "Event dispatched"
        );
        report
    }

    pub fn group(&self, id: ListenerId) -> Option<Arc<HandlerGroup>> {
        self.state.read().groups.get(&id).cloned()
    }

    pub fn is_registered(&self, id: ListenerId) -> bool {
        self.state.read().groups.contains_key(&id)
    }

    /// The listener owning `channel`, if any.
    pub fn owner_of(&self, channel: &str) -> Option<ListenerId> {
        self.state
            .read()
            .index
            .get(channel)
            .and_then(|owners| owners.first().copied())
    }

    /// All owned channels, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.state.read().index.keys().cloned().collect();
        channels.sort();
        channels
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.state.read().groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().groups.is_empty()
    }
}
