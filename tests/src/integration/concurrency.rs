//! # Concurrency Tests
//!
//! Registration racing registration, dispatch racing unregistration, and a
//! blocked handler coexisting with registry mutations.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use pat_bus::{listener, Event, HandlerGroup, ListenerId, MemoryBroker, PubSubApi, Registry};

    use crate::fixtures::{connected_client, eventually, ChannelProbe, PairDesk};

    const CONTENDERS: usize = 8;

    /// Parks inside its handler until released.
    #[derive(Default)]
    struct Gatekeeper {
        entered: AtomicBool,
        released: AtomicBool,
        finished: AtomicUsize,
    }

    impl Gatekeeper {
        fn on_slow(&self, _event: &Event) {
            self.entered.store(true, Ordering::SeqCst);
            while !self.released.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            self.finished.fetch_add(1, Ordering::SeqCst);
        }
    }

    listener!(Gatekeeper { "slow" => on_slow });

    #[tokio::test]
    async fn test_concurrent_registration_has_exactly_one_winner() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let probes: Vec<Arc<ChannelProbe>> =
            (0..CONTENDERS).map(|_| Arc::new(ChannelProbe::new())).collect();
        let barrier = Barrier::new(CONTENDERS);

        let winners: Vec<bool> = thread::scope(|scope| {
            let handles: Vec<_> = probes
                .iter()
                .map(|probe| {
                    let client = &client;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        client.register(probe).is_ok()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(winners.iter().filter(|won| **won).count(), 1);
        assert_eq!(broker.subscriber_count("shared"), 1);

        client.send("shared", b"x").unwrap();
        assert!(eventually(|| probes.iter().map(|p| p.hits.load(Ordering::SeqCst)).sum::<usize>() == 1).await);
        for (probe, won) in probes.iter().zip(&winners) {
            assert_eq!(client.is_registered(probe), *won);
        }
    }

    #[test]
    fn test_dispatch_survives_concurrent_unregister() {
        let registry = Arc::new(Registry::new());
        let desk = Arc::new(PairDesk::default());
        let id = ListenerId::of(&desk);
        let group = HandlerGroup::discover(Arc::clone(&desk)).unwrap();
        let stop = Arc::new(AtomicBool::new(false));

        let dispatcher = {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut invoked = 0;
                while !stop.load(Ordering::SeqCst) {
                    let report = registry.dispatch(&Event::new("a", "x"));
                    assert!(report.invoked <= 1, "torn registration observed");
                    assert_eq!(report.failed, 0);
                    invoked += report.invoked;
                }
                invoked
            })
        };

        for _ in 0..200 {
            registry.register(group.clone()).unwrap();
            registry.unregister(id);
        }
        stop.store(true, Ordering::SeqCst);
        let invoked = dispatcher.join().unwrap();

        assert!(!registry.is_registered(id));
        assert!(registry.dispatch(&Event::new("a", "x")).is_unmatched());
        // Every "a" invocation the dispatcher counted reached the listener.
        assert_eq!(desk.recorder.len(), invoked);
    }

    #[tokio::test]
    async fn test_blocked_handler_does_not_block_registration() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let gatekeeper = Arc::new(Gatekeeper::default());
        client.register(&gatekeeper).unwrap();

        client.send("slow", b"x").unwrap();
        assert!(eventually(|| gatekeeper.entered.load(Ordering::SeqCst)).await);

        let desk = Arc::new(PairDesk::default());
        client.register(&desk).unwrap();
        client.unregister(&desk).unwrap();
        assert_eq!(client.registered_channels(), vec!["slow".to_string()]);
        assert_eq!(gatekeeper.finished.load(Ordering::SeqCst), 0);

        gatekeeper.released.store(true, Ordering::SeqCst);
        assert!(eventually(|| gatekeeper.finished.load(Ordering::SeqCst) == 1).await);
    }
}
