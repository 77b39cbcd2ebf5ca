//! # Registry Properties
//!
//! Invariants that must hold for every sequence of operations, checked
//! directly against the [`Registry`](pat_bus::Registry) and through the
//! client for connection idempotence.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use pat_bus::{
        BoxError, Callback, Event, HandlerGroup, ListenerId, MemoryBroker, PubSubApi, Registry,
    };

    use crate::fixtures::{client, ChannelProbe, FaultyDesk, OrderDesk, PairDesk, RivalDesk};

    fn callback(f: impl Fn(&Event) + Send + Sync + 'static) -> Callback {
        Arc::new(move |event: &Event| -> Result<(), BoxError> {
            f(event);
            Ok(())
        })
    }

    // =========================================================================
    // P1: no duplicate ownership
    // =========================================================================

    #[test]
    fn test_channels_never_have_two_owners() {
        let groups: Vec<HandlerGroup> = vec![
            HandlerGroup::discover(Arc::new(OrderDesk::default())).unwrap(),
            HandlerGroup::discover(Arc::new(RivalDesk::default())).unwrap(),
            HandlerGroup::discover(Arc::new(PairDesk::default())).unwrap(),
            HandlerGroup::discover(Arc::new(FaultyDesk::default())).unwrap(),
            HandlerGroup::discover(Arc::new(ChannelProbe::new())).unwrap(),
            HandlerGroup::discover(Arc::new(ChannelProbe::new())).unwrap(),
        ];
        let registry = Registry::new();
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..500 {
            let group = &groups[rng.gen_range(0..groups.len())];
            if rng.gen_bool(1.0 / 3.0) {
                registry.unregister(group.id());
            } else {
                let _ = registry.register(group.clone());
            }

            let mut owned = HashSet::new();
            let mut total = 0;
            for candidate in &groups {
                if let Some(registered) = registry.group(candidate.id()) {
                    for channel in registered.channels() {
                        owned.insert(channel.to_string());
                        total += 1;
                    }
                }
            }
            assert_eq!(owned.len(), total, "a channel is owned twice");
            assert_eq!(registry.channels().len(), owned.len());
        }
    }

    // =========================================================================
    // P2: dispatch completeness and order
    // =========================================================================

    #[test]
    fn test_dispatch_invokes_every_subscription_once_in_order() {
        let registry = Registry::new();
        let desk = Arc::new(OrderDesk::default());
        let id = ListenerId::of(&desk);
        let order = Arc::new(Mutex::new(Vec::new()));

        registry
            .register(HandlerGroup::discover(Arc::clone(&desk)).unwrap())
            .unwrap();
        for tag in ["first", "second"] {
            let sink = Arc::clone(&order);
            registry
                .subscribe_callback(id, "orders", callback(move |_| sink.lock().push(tag)))
                .unwrap();
        }

        let report = registry.dispatch(&Event::new("orders", "x"));

        assert_eq!(report.owners, 1);
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(desk.recorder.len(), 1);
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    // =========================================================================
    // P3: isolation
    // =========================================================================

    #[test]
    fn test_failing_subscription_does_not_stop_later_ones() {
        let registry = Registry::new();
        let desk = Arc::new(FaultyDesk::default());
        let id = ListenerId::of(&desk);
        let reached = Arc::new(Mutex::new(0));

        registry
            .register(HandlerGroup::discover(Arc::clone(&desk)).unwrap())
            .unwrap();
        for channel in ["faulty", "panicky"] {
            let sink = Arc::clone(&reached);
            registry
                .subscribe_callback(id, channel, callback(move |_| *sink.lock() += 1))
                .unwrap();
        }

        let errored = registry.dispatch(&Event::new("faulty", "x"));
        let panicked = registry.dispatch(&Event::new("panicky", "x"));

        assert_eq!((errored.invoked, errored.failed), (2, 1));
        assert_eq!((panicked.invoked, panicked.failed), (2, 1));
        assert_eq!(*reached.lock(), 2);
    }

    // =========================================================================
    // P4: unregister removes exactly its own
    // =========================================================================

    #[test]
    fn test_unregister_leaves_other_listeners_intact() {
        let registry = Registry::new();
        let orders = Arc::new(OrderDesk::default());
        let pair = Arc::new(PairDesk::default());
        registry
            .register(HandlerGroup::discover(Arc::clone(&orders)).unwrap())
            .unwrap();
        registry
            .register(HandlerGroup::discover(Arc::clone(&pair)).unwrap())
            .unwrap();

        let delta = registry.unregister(ListenerId::of(&pair));

        let mut released = delta.unsubscribe.clone();
        released.sort();
        assert_eq!(released, vec!["a".to_string(), "b".to_string()]);
        assert!(registry.dispatch(&Event::new("a", "x")).is_unmatched());
        assert!(registry.dispatch(&Event::new("b", "x")).is_unmatched());
        assert_eq!(registry.dispatch(&Event::new("orders", "x")).invoked, 1);
        assert!(pair.recorder.is_empty());
        assert_eq!(orders.recorder.len(), 1);
    }

    // =========================================================================
    // P5: idempotent connect / disconnect
    // =========================================================================

    #[test]
    fn test_repeated_connect_and_disconnect_match_single_calls() {
        let broker = MemoryBroker::new();
        let client = client(&broker);
        client.register(&Arc::new(PairDesk::default())).unwrap();

        client.connect().unwrap();
        let once = (broker.connection_count(), broker.subscriber_count("a"));
        client.connect().unwrap();
        let twice = (broker.connection_count(), broker.subscriber_count("a"));
        assert_eq!(once, (1, 1));
        assert_eq!(once, twice);

        client.disconnect().unwrap();
        let once = (broker.connection_count(), broker.subscriber_count("a"), client.is_connected());
        client.disconnect().unwrap();
        let twice = (broker.connection_count(), broker.subscriber_count("a"), client.is_connected());
        assert_eq!(once, (0, 0, false));
        assert_eq!(once, twice);
    }
}
