//! Live integration tests against the public Kraken WebSocket feed.
//!
//! These tests require network access.
//! Run with: `cargo test --features integration-tests`

#![cfg(feature = "integration-tests")]

mod common;

use std::time::Duration;

use serde_json::json;

use kraken_replica::book::{BookParams, BookRegistry, ReplicaState};
use kraken_replica::bus::update_bus;
use kraken_replica::payload::ChannelPayload;
use kraken_replica::websocket::{FeedProcessor, Transport, connect};

use common::KRAKEN_WS_URL;

#[tokio::test]
async fn test_connect_to_kraken_websocket() {
    let result = connect(KRAKEN_WS_URL).await;
    assert!(result.is_ok(), "Failed to connect to Kraken WebSocket");
}

#[tokio::test]
async fn test_book_subscription_goes_live() {
    common::init_tracing();
    let mut transport = connect(KRAKEN_WS_URL).await.expect("Failed to connect");

    let subscribe = json!({
        "event": "subscribe",
        "pair": ["XBT/USD"],
        "subscription": { "name": "book", "depth": 10 }
    });
    transport
        .send(subscribe.to_string())
        .await
        .expect("Failed to subscribe to book");

    let (tx, mut rx) = update_bus(64);
    let mut feed = FeedProcessor::new(BookRegistry::new(BookParams::default()), tx);

    // Stop after the snapshot and a handful of verified deltas.
    let consumer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(update) = rx.recv().await {
            if matches!(
                update.payload,
                ChannelPayload::BookSnapshot(_) | ChannelPayload::BookDelta(_)
            ) {
                seen.push(update.replica);
            }
            if seen.len() >= 5 {
                break;
            }
        }
        seen
    });

    let shutdown = tokio::time::sleep(Duration::from_secs(20));
    let _ = feed.run(&mut transport, shutdown).await;

    let seen = consumer.await.expect("consumer task panicked");
    assert!(!seen.is_empty(), "No book updates received");
    assert_eq!(seen[0], Some(ReplicaState::Live));
    assert_ne!(feed.books().state("XBT/USD"), None);
}
