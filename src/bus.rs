//! Bounded, order-preserving delivery of typed updates.
//!
//! A full bus blocks the producer rather than dropping updates, so a slow
//! consumer slows frame processing down instead of losing book deltas.
//!
//! The bus has a single consumer. Callers that need several consumers
//! forward updates from the [`UpdateReceiver`] themselves, for example into
//! a `tokio::sync::broadcast` channel.

use tokio::sync::mpsc;

use crate::book::ReplicaState;
use crate::payload::ChannelPayload;
use crate::{FeedError, Result};

/// A decoded payload with its routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub channel_id: Option<i64>,
    pub channel_name: String,
    pub pair: Option<String>,
    pub sequence: Option<i64>,
    pub payload: ChannelPayload,
    /// State of the pair's replica after a book payload was applied.
    pub replica: Option<ReplicaState>,
}

/// Creates a bus holding at most `capacity` undelivered updates.
///
/// # Panics
///
/// Panics if `capacity` is zero. [`fetch_config`](crate::config::fetch_config)
/// rejects a zero capacity.
pub fn update_bus(capacity: usize) -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// Producer half, owned by the processing path.
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::Sender<Update>,
}

impl UpdateSender {
    /// Enqueues `update`, waiting for room if the bus is full.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::BusClosed`] once the receiver is dropped.
    pub async fn send(&self, update: Update) -> Result<()> {
        self.tx.send(update).await.map_err(|_| FeedError::BusClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots left before `send` starts waiting.
    pub fn capacity(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::Receiver<Update>,
}

impl UpdateReceiver {
    /// Waits for the next update. Returns `None` once every sender is gone
    /// and the bus is drained.
    pub async fn recv(&mut self) -> Option<Update> {
        self.rx.recv().await
    }

    /// Returns the next update if one is already queued.
    pub fn try_recv(&mut self) -> Option<Update> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
