//! # Compression Flows
//!
//! Two clients sharing one broker, with and without the zstd payload codec.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};

    use pat_bus::{
        listener, CompressionConfig, Event, MemoryBroker, PatBuilder, PatClient, PubSubApi,
    };
    use pat_telemetry::log_channel_event;

    use crate::fixtures::{client_named, eventually, settle, OrderDesk};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Quote {
        symbol: String,
        bid: u64,
        ask: u64,
    }

    #[derive(Default)]
    struct QuoteBoard {
        quotes: Mutex<Vec<Quote>>,
    }

    impl QuoteBoard {
        fn on_quote(&self, event: &Event) -> Result<(), serde_json::Error> {
            let quote: Quote = serde_json::from_slice(event.payload())?;
            log_channel_event!(debug, event.channel(), "Quote received", symbol = %quote.symbol);
            self.quotes.lock().push(quote);
            Ok(())
        }
    }

    listener!(QuoteBoard { "quotes" => on_quote });

    fn zstd_client(broker: &MemoryBroker, name: &str) -> PatClient {
        pat_telemetry::init_test_logging();
        let client = PatBuilder::new(broker.named_connection(name))
            .with_client_name(name)
            .with_compression(CompressionConfig::zstd(5))
            .build()
            .unwrap();
        client.connect().unwrap();
        client
    }

    #[tokio::test]
    async fn test_compressed_json_between_clients() -> anyhow::Result<()> {
        let broker = MemoryBroker::new();
        let publisher = zstd_client(&broker, "publisher");
        let subscriber = zstd_client(&broker, "subscriber");
        let board = Arc::new(QuoteBoard::default());
        subscriber.register(&board)?;

        let quote = Quote {
            symbol: "PAT".to_string(),
            bid: 101,
            ask: 103,
        };
        let delivered = publisher.send_json("quotes", &quote)?;

        assert_eq!(delivered, 1);
        assert!(eventually(|| board.quotes.lock().len() == 1).await);
        assert_eq!(board.quotes.lock()[0], quote);
        Ok(())
    }

    #[tokio::test]
    async fn test_plain_payload_is_dropped_by_compressing_subscriber() {
        let broker = MemoryBroker::new();
        let plain = client_named(&broker, "plain");
        plain.connect().unwrap();
        let compressing = zstd_client(&broker, "compressing");
        let desk = Arc::new(OrderDesk::default());
        compressing.register(&desk).unwrap();

        assert_eq!(plain.send("orders", b"not a frame").unwrap(), 1);
        settle().await;

        assert!(desk.recorder.is_empty());
        assert!(compressing.is_connected());
    }

    #[tokio::test]
    async fn test_plain_subscriber_sees_compressed_bytes() {
        let broker = MemoryBroker::new();
        let plain = client_named(&broker, "plain");
        plain.connect().unwrap();
        let compressing = zstd_client(&broker, "compressing");
        let desk = Arc::new(OrderDesk::default());
        plain.register(&desk).unwrap();

        let body = "order-".repeat(32);
        compressing.send("orders", body.as_bytes()).unwrap();

        assert!(eventually(|| desk.recorder.len() == 1).await);
        let received = desk.recorder.payloads().remove(0);
        assert_ne!(received, body.as_bytes());
        assert!(received.len() < body.len());
    }
}
