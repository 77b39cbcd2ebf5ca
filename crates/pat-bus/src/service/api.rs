use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::{ConnectionState, PatClient};
use crate::domain::{Callback, Event, HandlerGroup, HandlerOutcome, Listener, ListenerId};
use crate::error::PatError;
use crate::ports::{PendingDelivery, PubSubApi};

impl PubSubApi for PatClient {
    fn connect(&self) -> Result<(), PatError> {
        let _gate = self.gate.lock();
        let mut session = self.session.lock();
        match session.state {
            ConnectionState::Connected => return Ok(()),
            ConnectionState::ShutDown => return Err(PatError::ShutDown),
            ConnectionState::Disconnected => {}
        }

        let attached = Arc::new(AtomicBool::new(true));
        self.transport.open(self.bridge(Arc::clone(&attached)))?;

        let channels = self.registry.channels();
        if let Err(e) = self.subscribe_all(&channels) {
            attached.store(false, Ordering::Release);
            if let Err(close) = self.transport.close() {
                warn!(error = %close, "Transport close failed after subscribe error");
            }
            return Err(e);
        }

        session.state = ConnectionState::Connected;
        session.attached = Some(attached);
        info!(
            client = %self.config.client_name,
            channels = channels.len(),
            "Connected"
        );
        Ok(())
    }

    fn disconnect(&self) -> Result<(), PatError> {
        let _gate = self.gate.lock();
        let mut session = self.session.lock();
        if session.state != ConnectionState::Connected {
            return Ok(());
        }

        if let Some(attached) = session.attached.take() {
            attached.store(false, Ordering::Release);
        }
        session.state = ConnectionState::Disconnected;
        self.transport.close()?;

        info!(client = %self.config.client_name, "Disconnected");
        Ok(())
    }

    fn shutdown(&self) -> Result<(), PatError> {
        self.disconnect()?;

        let _gate = self.gate.lock();
        let mut session = self.session.lock();
        if session.state == ConnectionState::ShutDown {
            return Ok(());
        }
        self.transport.release()?;
        session.state = ConnectionState::ShutDown;

        info!(client = %self.config.client_name, "Shut down");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.is_live()
    }

    fn register<L: Listener>(&self, listener: &Arc<L>) -> Result<ListenerId, PatError> {
        let group = HandlerGroup::discover(Arc::clone(listener))?;
        let id = group.id();

        let _gate = self.lock_gate()?;
        let previous = self.registry.group(id);
        let delta = self.registry.register(group)?;
        self.apply_delta(id, previous, &delta)?;

        Ok(id)
    }

    fn unregister<L: Listener>(&self, listener: &Arc<L>) -> Result<(), PatError> {
        let id = ListenerId::of(listener);

        let _gate = self.lock_gate()?;
        let delta = self.registry.unregister(id);
        if self.is_live() {
            self.unsubscribe_all(&delta.unsubscribe)?;
        }
        Ok(())
    }

    fn subscribe_callback<L, F, O>(
        &self,
        listener: &Arc<L>,
        channel: &str,
        callback: F,
    ) -> Result<(), PatError>
    where
        L: Listener,
        F: Fn(&Event) -> O + Send + Sync + 'static,
        O: HandlerOutcome,
    {
        let id = ListenerId::of(listener);
        let callback: Callback = Arc::new(move |event: &Event| callback(event).into_result());

        let _gate = self.lock_gate()?;
        let previous = self.registry.group(id);
        let delta = self.registry.subscribe_callback(id, channel, callback)?;
        self.apply_delta(id, previous, &delta)
    }

    fn send<P: AsRef<[u8]>>(&self, channel: &str, payload: P) -> Result<usize, PatError> {
        let payload = self.outbound(payload.as_ref())?;
        let delivered = self.transport.publish(channel, payload)?;
        debug!(channel = %channel, delivered, "Message sent");
        Ok(delivered)
    }

    fn send_async<P: AsRef<[u8]>>(&self, channel: &str, payload: P) -> Result<PendingDelivery, PatError> {
        let payload = self.outbound(payload.as_ref())?;
        debug!(channel = %channel, "Message queued");
        Ok(self.transport.publish_async(channel, payload))
    }
}
