//! Checksum-verified order book replicas.
//!
//! - [`side`]: one sorted, depth-bounded side of a book
//! - [`checksum`]: the exchange's CRC32 top-of-book checksum
//! - [`replica`]: the per-symbol snapshot/delta state machine
//!
//! [`BookRegistry`] owns every replica, keyed by symbol. A symbol with no
//! entry is uninitialized.

pub mod checksum;
pub mod replica;
pub mod side;

use std::collections::HashMap;

use tracing::{debug, info};

pub use checksum::Precision;
pub use replica::{ApplyOutcome, OrderBookReplica, ReplicaState};
pub use side::BookSide;

use crate::Result;
use crate::payload::ChannelPayload;

/// Construction parameters for a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookParams {
    /// Levels retained per side.
    pub depth: usize,
    /// Levels per side covered by the checksum.
    pub checksum_levels: usize,
    /// Decimal places prices are rendered with for the checksum.
    pub price_precision: Option<u32>,
    /// Decimal places volumes are rendered with for the checksum.
    pub volume_precision: Option<u32>,
}

impl Default for BookParams {
    fn default() -> Self {
        Self {
            depth: 10,
            checksum_levels: 10,
            price_precision: None,
            volume_precision: None,
        }
    }
}

/// All replicas for one connection.
#[derive(Debug, Default)]
pub struct BookRegistry {
    defaults: BookParams,
    precisions: HashMap<String, Precision>,
    replicas: HashMap<String, OrderBookReplica>,
}

impl BookRegistry {
    pub fn new(defaults: BookParams) -> Self {
        Self {
            defaults,
            precisions: HashMap::new(),
            replicas: HashMap::new(),
        }
    }

    /// Registers the pair's price and volume precision for checksums of
    /// replicas created afterwards.
    pub fn set_precision(&mut self, symbol: impl Into<String>, precision: Precision) {
        self.precisions.insert(symbol.into(), precision);
    }

    /// Creates an `AwaitingSnapshot` replica for a newly acknowledged
    /// subscription. An existing replica is left untouched.
    pub fn subscribed(&mut self, symbol: &str, depth: Option<usize>) -> &OrderBookReplica {
        let params = self.params_for(symbol, depth);
        self.replicas.entry(symbol.to_string()).or_insert_with(|| {
            info!(symbol, depth = params.depth, "Order book replica created");
            OrderBookReplica::new(symbol, params)
        })
    }

    /// Handles an acknowledged unsubscribe by destroying the replica.
    pub fn unsubscribed(&mut self, symbol: &str) {
        if self.replicas.remove(symbol).is_some() {
            info!(symbol, "Unsubscribed; order book replica dropped");
        }
    }

    /// Takes the replica for `symbol` out of the registry, typically ahead
    /// of a resubscription.
    pub fn remove(&mut self, symbol: &str) -> Option<OrderBookReplica> {
        let removed = self.replicas.remove(symbol);
        if removed.is_some() {
            info!(symbol, "Order book replica removed");
        }
        removed
    }

    pub fn get(&self, symbol: &str) -> Option<&OrderBookReplica> {
        self.replicas.get(symbol)
    }

    /// Replica state, or `None` while the symbol is uninitialized.
    pub fn state(&self, symbol: &str) -> Option<ReplicaState> {
        self.replicas.get(symbol).map(OrderBookReplica::state)
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Symbols whose replicas need a resubscription.
    pub fn desynced(&self) -> impl Iterator<Item = &str> {
        self.replicas
            .values()
            .filter(|r| r.state() == ReplicaState::Desynced)
            .map(OrderBookReplica::symbol)
    }

    /// Routes a book payload to the replica for `symbol`.
    ///
    /// Snapshots create the replica if needed. Deltas for an uninitialized
    /// symbol are discarded. Returns `Ok(None)` for non-book payloads.
    ///
    /// # Errors
    ///
    /// Propagates [`FeedError::ChecksumMismatch`](crate::FeedError) and
    /// [`FeedError::SchemaMismatch`](crate::FeedError) from the replica.
    pub fn apply(&mut self, symbol: &str, payload: &ChannelPayload) -> Result<Option<ApplyOutcome>> {
        let outcome = match payload {
            ChannelPayload::BookSnapshot(snapshot) => {
                self.replica_for_snapshot(symbol).apply_book_snapshot(snapshot)
            }
            ChannelPayload::AccountOrders(update) if update.is_snapshot => {
                self.replica_for_snapshot(symbol).apply_orders(update)?
            }
            ChannelPayload::BookDelta(delta) => match self.replicas.get_mut(symbol) {
                Some(replica) => replica.apply_book_delta(delta)?,
                None => {
                    debug!(symbol, "Discarding delta for uninitialized book");
                    ApplyOutcome::Discarded
                }
            },
            ChannelPayload::AccountOrders(update) => match self.replicas.get_mut(symbol) {
                Some(replica) => replica.apply_orders(update)?,
                None => {
                    debug!(symbol, "Discarding account update for uninitialized book");
                    ApplyOutcome::Discarded
                }
            },
            _ => return Ok(None),
        };
        Ok(Some(outcome))
    }

    fn replica_for_snapshot(&mut self, symbol: &str) -> &mut OrderBookReplica {
        let params = self.params_for(symbol, None);
        self.replicas.entry(symbol.to_string()).or_insert_with(|| {
            debug!(symbol, "Creating replica on first snapshot");
            OrderBookReplica::new(symbol, params)
        })
    }

    fn params_for(&self, symbol: &str, depth: Option<usize>) -> BookParams {
        let precision = self.precisions.get(symbol).copied().unwrap_or_default();
        BookParams {
            depth: depth.unwrap_or(self.defaults.depth),
            price_precision: precision.price.or(self.defaults.price_precision),
            volume_precision: precision.volume.or(self.defaults.volume_precision),
            ..self.defaults
        }
    }
}
