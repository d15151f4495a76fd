//! Shared test utilities and constants.

#![allow(dead_code)]

use std::collections::VecDeque;

use kraken_replica::websocket::Transport;
use kraken_replica::{FeedError, Result};

/// Kraken WebSocket public endpoint URL.
pub const KRAKEN_WS_URL: &str = "wss://ws.kraken.com";

/// Routes `tracing` output through the test harness's captured stdout.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// In-memory transport replaying a fixed list of frames.
#[derive(Debug, Default)]
pub struct MockTransport {
    frames: VecDeque<Result<String>>,
    pub sent: Vec<String>,
    pub closed: bool,
}

impl MockTransport {
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: frames.into_iter().map(|f| Ok(f.into())).collect(),
            ..Self::default()
        }
    }

    /// Queues a receive error after the frames already queued.
    pub fn then_fail(mut self) -> Self {
        self.frames
            .push_back(Err(FeedError::WebSocket(tungstenite::Error::ConnectionClosed)));
        self
    }
}

impl Transport for MockTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.sent.push(text);
        Ok(())
    }

    async fn receive(&mut self) -> Option<Result<String>> {
        self.frames.pop_front()
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
