//! # Scenario Tests
//!
//! Register / publish / unregister walkthroughs through the client facade:
//!
//! 1. **Delivery**: a registered handler receives exactly what was sent
//! 2. **Conflict**: a second owner of a channel is rejected and stays silent
//! 3. **Removal**: after unregistering, publishing is a silent no-op
//! 4. **Failure**: a failing handler leaves the client fully usable
//! 5. **Callbacks**: ad-hoc callbacks live and die with their listener

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use pat_bus::{Event, MemoryBroker, PatError, PubSubApi, RegistrationError};

    use crate::fixtures::{connected_client, eventually, settle, FaultyDesk, OrderDesk, PairDesk, RivalDesk};

    #[tokio::test]
    async fn test_registered_handler_receives_published_event() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let desk = Arc::new(OrderDesk::default());
        client.register(&desk).unwrap();

        let delivered = client.send("orders", b"hello").unwrap();

        assert_eq!(delivered, 1);
        assert!(eventually(|| desk.recorder.len() == 1).await);
        settle().await;
        assert_eq!(desk.recorder.len(), 1, "handler must fire exactly once");
        assert_eq!(desk.recorder.tags(), vec!["orders".to_string()]);
        assert_eq!(desk.recorder.payloads(), vec![b"hello".to_vec()]);
    }

    #[tokio::test]
    async fn test_conflicting_listener_is_rejected_and_silent() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let desk = Arc::new(OrderDesk::default());
        let rival = Arc::new(RivalDesk::default());
        client.register(&desk).unwrap();

        let err = client.register(&rival).unwrap_err();

        match err {
            PatError::Registration(RegistrationError::DuplicateSubscription { channel, listener }) => {
                assert_eq!(channel, "orders");
                assert!(listener.ends_with("RivalDesk"));
            }
            other => panic!("expected duplicate subscription, got {other:?}"),
        }
        assert!(!client.is_registered(&rival));

        client.send("orders", b"x").unwrap();
        assert!(eventually(|| desk.recorder.len() == 1).await);
        settle().await;
        assert!(rival.recorder.is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_channel_is_a_silent_no_op() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let desk = Arc::new(PairDesk::default());
        client.register(&desk).unwrap();
        client.unregister(&desk).unwrap();

        let delivered = client.send("a", b"late").unwrap();

        assert_eq!(delivered, 0);
        settle().await;
        assert!(desk.recorder.is_empty());
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_disturb_client() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let faulty = Arc::new(FaultyDesk::default());
        let desk = Arc::new(OrderDesk::default());
        client.register(&faulty).unwrap();
        client.register(&desk).unwrap();

        client.send("faulty", b"1").unwrap();
        client.send("panicky", b"2").unwrap();
        assert!(eventually(|| faulty.attempts.load(Ordering::SeqCst) == 2).await);

        assert!(client.is_connected());
        client.send("orders", b"after").unwrap();
        assert!(eventually(|| desk.recorder.len() == 1).await);

        // The delivery thread survived the panic: the faulty channel still fires.
        client.send("faulty", b"3").unwrap();
        assert!(eventually(|| faulty.attempts.load(Ordering::SeqCst) == 3).await);
    }

    #[tokio::test]
    async fn test_callback_is_removed_with_its_listener() {
        let broker = MemoryBroker::new();
        let client = connected_client(&broker);
        let desk = Arc::new(PairDesk::default());
        let hits = Arc::new(AtomicUsize::new(0));
        client.register(&desk).unwrap();

        let sink = Arc::clone(&hits);
        client
            .subscribe_callback(&desk, "c", move |event: &Event| {
                assert_eq!(event.channel(), "c");
                sink.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        client.send("c", b"first").unwrap();
        assert!(eventually(|| hits.load(Ordering::SeqCst) == 1).await);

        client.unregister(&desk).unwrap();
        assert_eq!(client.send("c", b"second").unwrap(), 0);
        settle().await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
