//! # Handler Group
//!
//! The per-listener bundle of `channel → [Subscription]` bindings. Built once
//! at registration from the listener's bind table; callback subscriptions are
//! appended later. Channels keep first-insertion order and every channel
//! present maps to a non-empty list.

use std::sync::Arc;

use super::errors::{InvocationError, RegistrationError};
use super::event::Event;
use super::listener::{Binder, Listener, ListenerId};
use super::subscription::{ListenerRef, MethodSubscription, Subscription};

/// All subscriptions owned by one registered listener instance.
#[derive(Clone)]
pub struct HandlerGroup {
    id: ListenerId,
    listener: ListenerRef,
    listener_type: &'static str,
    channels: Vec<(String, Vec<Subscription>)>,
}

impl HandlerGroup {
    /// Builds the group for `listener` from its declared bind table.
    ///
    /// Fails if the table binds one channel twice or names an invalid channel.
    pub fn discover<L: Listener>(listener: Arc<L>) -> Result<Self, RegistrationError> {
        let id = ListenerId::of(&listener);
        let listener_type = std::any::type_name::<L>();
        let mut group = Self {
            id,
            listener,
            listener_type,
            channels: Vec::new(),
        };

        for binding in Binder::<L>::collect() {
            let subscription = MethodSubscription::new(&binding.channel, binding.handler, binding.method)?;
            if group.has_channel(&binding.channel) {
                return Err(RegistrationError::DuplicateChannelInListener {
                    channel: binding.channel,
                    listener: listener_type,
                });
            }
            group
                .channels
                .push((binding.channel, vec![Subscription::Method(subscription)]));
        }

        Ok(group)
    }

    /// Appends `subscription` to `channel`. Cross-listener ownership is the
    /// registry's concern and is not checked here.
    pub fn add_subscription(&mut self, channel: &str, subscription: Subscription) {
        match self.channels.iter_mut().find(|(name, _)| name == channel) {
            Some((_, subscriptions)) => subscriptions.push(subscription),
            None => self.channels.push((channel.to_string(), vec![subscription])),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn listener_type(&self) -> &'static str {
        self.listener_type
    }

    /// Channel names in first-insertion order.
    pub fn channels(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.iter().map(|(name, _)| name.as_str())
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|(name, _)| name == channel)
    }

    pub fn subscriptions(&self, channel: &str) -> &[Subscription] {
        self.channels
            .iter()
            .find(|(name, _)| name == channel)
            .map(|(_, subs)| subs.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Invokes every subscription for the event's channel in insertion order.
    ///
    /// Returns the number of subscriptions invoked and the failures collected.
    pub(crate) fn handle(&self, event: &Event) -> (usize, Vec<InvocationError>) {
        let subscriptions = self.subscriptions(event.channel());
        let failures = subscriptions
            .iter()
            .filter_map(|sub| sub.handle(self.listener.as_ref(), event).err())
            .collect();
        (subscriptions.len(), failures)
    }
}

impl std::fmt::Debug for HandlerGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerGroup")
            .field("id", &self.id)
            .field("listener", &self.listener_type)
            .field("channels", &self.channels().collect::<Vec<_>>())
            .finish()
    }
}
