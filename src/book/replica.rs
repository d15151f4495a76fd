//! Per-symbol order book replica.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::BookParams;
use super::checksum::{Precision, book_checksum};
use super::side::BookSide;
use crate::models::book::{
    BookDelta, BookLevel, BookSnapshot, OrderEvent, OrderEventKind, PriceLevel, Side,
};
use crate::models::orders::OrdersUpdate;
use crate::{FeedError, Result};

/// Lifecycle of a replica. A symbol without a replica is uninitialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaState {
    /// Subscription acknowledged; waiting for the first full book.
    AwaitingSnapshot,
    /// Book initialized and applying deltas.
    Live,
    /// The last checksum check failed; levels are not trusted until the
    /// next snapshot.
    Desynced,
}

/// What applying a book payload did to a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Both sides were replaced; the replica is live.
    Replaced { checksum: u32 },
    /// A delta was applied and, when the server sent one, its checksum
    /// matched.
    Applied { checksum: u32 },
    /// A delta arrived without a trusted base state and was dropped.
    Discarded,
}

/// A level-3 order resting in the book, keyed by its order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RestingOrder {
    side: Side,
    price: Decimal,
    volume: Decimal,
}

/// Locally replicated order book for one symbol.
#[derive(Debug, Clone)]
pub struct OrderBookReplica {
    symbol: String,
    bids: BookSide,
    asks: BookSide,
    /// Level-3 orders by id, so a delete removes only that order's volume.
    orders: HashMap<String, RestingOrder>,
    checksum_levels: usize,
    precision: Precision,
    state: ReplicaState,
    last_checksum: Option<u32>,
}

impl OrderBookReplica {
    /// Creates an empty replica awaiting its snapshot.
    pub fn new(symbol: impl Into<String>, params: BookParams) -> Self {
        Self {
            symbol: symbol.into(),
            bids: BookSide::new(Side::Bid, params.depth),
            asks: BookSide::new(Side::Ask, params.depth),
            orders: HashMap::new(),
            checksum_levels: params.checksum_levels,
            precision: Precision {
                price: params.price_precision,
                volume: params.volume_precision,
            },
            state: ReplicaState::AwaitingSnapshot,
            last_checksum: None,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn state(&self) -> ReplicaState {
        self.state
    }

    pub fn depth(&self) -> usize {
        self.bids.depth()
    }

    pub fn bids(&self) -> &BookSide {
        &self.bids
    }

    pub fn asks(&self) -> &BookSide {
        &self.asks
    }

    /// Checksum computed after the most recent snapshot or delta.
    pub fn last_checksum(&self) -> Option<u32> {
        self.last_checksum
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.bids.best()
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.asks.best()
    }

    /// Best ask minus best bid, when both sides have levels.
    pub fn spread(&self) -> Option<Decimal> {
        Some(self.best_ask()?.price - self.best_bid()?.price)
    }

    /// Recomputes the checksum over the current top of book.
    pub fn checksum(&self) -> u32 {
        book_checksum(&self.asks, &self.bids, self.checksum_levels, self.precision)
    }

    /// Replaces both sides wholesale and goes live, whatever the prior state.
    ///
    /// Levels beyond the replica depth are dropped, keeping the best ones.
    pub fn apply_snapshot<A, B>(&mut self, asks: A, bids: B) -> ApplyOutcome
    where
        A: IntoIterator<Item = PriceLevel>,
        B: IntoIterator<Item = PriceLevel>,
    {
        self.asks.clear();
        self.bids.clear();
        self.orders.clear();
        for level in asks {
            self.asks.upsert(level.price, level.volume);
        }
        for level in bids {
            self.bids.upsert(level.price, level.volume);
        }

        let checksum = self.checksum();
        self.last_checksum = Some(checksum);
        self.state = ReplicaState::Live;
        debug!(
            symbol = %self.symbol,
            asks = self.asks.len(),
            bids = self.bids.len(),
            checksum,
            "Book snapshot applied"
        );

        ApplyOutcome::Replaced { checksum }
    }

    pub fn apply_book_snapshot(&mut self, snapshot: &BookSnapshot) -> ApplyOutcome {
        let to_level = |l: &BookLevel| PriceLevel {
            price: l.price,
            volume: l.volume,
        };
        self.apply_snapshot(
            snapshot.asks.iter().map(to_level),
            snapshot.bids.iter().map(to_level),
        )
    }

    /// Applies a batch of events and verifies the result against
    /// `expected`, when given.
    ///
    /// Deltas are dropped unless the replica is live.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::ChecksumMismatch`] after moving the replica to
    /// [`ReplicaState::Desynced`].
    pub fn apply_delta(
        &mut self,
        asks: &[OrderEvent],
        bids: &[OrderEvent],
        expected: Option<u32>,
    ) -> Result<ApplyOutcome> {
        if !self.accepts_delta() {
            return Ok(ApplyOutcome::Discarded);
        }

        for event in asks {
            apply_event(&mut self.asks, event, &self.symbol);
        }
        for event in bids {
            apply_event(&mut self.bids, event, &self.symbol);
        }
        self.verify(expected)
    }

    pub fn apply_book_delta(&mut self, delta: &BookDelta) -> Result<ApplyOutcome> {
        self.apply_delta(&delta.asks, &delta.bids, delta.checksum)
    }

    /// Applies a level-3 account update: a full replacement when
    /// `is_snapshot` is set, a delta otherwise.
    ///
    /// Snapshot orders resting at the same price are summed into one level.
    /// Orders carrying an id are tracked, so a later modify or delete moves
    /// only that order's volume. Events without an id act on the whole
    /// level as in [`apply_delta`](Self::apply_delta).
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::SchemaMismatch`] if the checksum does not fit in
    /// 32 bits, or [`FeedError::ChecksumMismatch`] as for
    /// [`apply_delta`](Self::apply_delta).
    pub fn apply_orders(&mut self, update: &OrdersUpdate) -> Result<ApplyOutcome> {
        if update.is_snapshot {
            let outcome = self.apply_snapshot(aggregate(&update.asks), aggregate(&update.bids));
            self.track(Side::Ask, &update.asks);
            self.track(Side::Bid, &update.bids);
            return Ok(outcome);
        }

        let expected = u32::try_from(update.checksum).map_err(|_| {
            FeedError::SchemaMismatch(format!(
                "{}: checksum out of range: {}",
                update.symbol, update.checksum
            ))
        })?;
        if !self.accepts_delta() {
            return Ok(ApplyOutcome::Discarded);
        }

        for event in &update.asks {
            self.apply_order_event(Side::Ask, event);
        }
        for event in &update.bids {
            self.apply_order_event(Side::Bid, event);
        }
        self.verify(Some(expected))
    }

    /// Number of level-3 orders currently tracked by id.
    pub fn tracked_orders(&self) -> usize {
        self.orders.len()
    }

    fn accepts_delta(&self) -> bool {
        if self.state == ReplicaState::Live {
            return true;
        }
        debug!(symbol = %self.symbol, state = ?self.state, "Discarding delta");
        false
    }

    /// Records the computed checksum and compares it with `expected`.
    fn verify(&mut self, expected: Option<u32>) -> Result<ApplyOutcome> {
        let computed = self.checksum();
        self.last_checksum = Some(computed);

        match expected {
            Some(expected) if expected != computed => {
                self.state = ReplicaState::Desynced;
                warn!(symbol = %self.symbol, expected, computed, "Book checksum mismatch");
                Err(FeedError::ChecksumMismatch {
                    symbol: self.symbol.clone(),
                    expected,
                    computed,
                })
            }
            _ => Ok(ApplyOutcome::Applied { checksum: computed }),
        }
    }

    fn track(&mut self, side: Side, events: &[OrderEvent]) {
        for event in events {
            if event.kind == OrderEventKind::Delete || event.volume.is_zero() {
                continue;
            }
            if let Some(order_id) = &event.order_id {
                let order = RestingOrder {
                    side,
                    price: event.price,
                    volume: event.volume,
                };
                self.orders.insert(order_id.clone(), order);
            }
        }
    }

    fn apply_order_event(&mut self, side: Side, event: &OrderEvent) {
        let Some(order_id) = event.order_id.as_deref() else {
            let (book, symbol) = match side {
                Side::Ask => (&mut self.asks, &self.symbol),
                Side::Bid => (&mut self.bids, &self.symbol),
            };
            apply_event(book, event, symbol);
            return;
        };

        match event.kind {
            OrderEventKind::Add | OrderEventKind::Modify => {
                let order = RestingOrder {
                    side,
                    price: event.price,
                    volume: event.volume,
                };
                let previous = if event.volume.is_zero() {
                    self.orders.remove(order_id)
                } else {
                    self.orders.insert(order_id.to_string(), order)
                };
                if let Some(previous) = previous {
                    self.adjust_level(previous.side, previous.price, -previous.volume);
                }
                self.adjust_level(side, event.price, event.volume);
            }
            OrderEventKind::Delete => match self.orders.remove(order_id) {
                Some(previous) => {
                    self.adjust_level(previous.side, previous.price, -previous.volume);
                }
                None => {
                    debug!(symbol = %self.symbol, order_id, "Delete for untracked order");
                }
            },
        }
    }

    /// Adds `change` to the level at `price`, removing it once empty.
    fn adjust_level(&mut self, side: Side, price: Decimal, change: Decimal) {
        let book = match side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        };
        let volume = book.volume_at(price).unwrap_or_default() + change;
        if volume <= Decimal::ZERO {
            book.remove(price);
        } else if let Some(evicted) = book.upsert(price, volume) {
            debug!(symbol = %self.symbol, side = ?side, %evicted, "Evicted level beyond depth");
        }
    }
}

fn apply_event(side: &mut BookSide, event: &OrderEvent, symbol: &str) {
    match event.kind {
        // Add on an existing price and modify on a missing one both set the
        // level, so the two share a path.
        OrderEventKind::Add | OrderEventKind::Modify => {
            if let Some(evicted) = side.upsert(event.price, event.volume) {
                debug!(symbol, side = ?side.side(), %evicted, "Evicted level beyond depth");
            }
        }
        OrderEventKind::Delete => {
            if side.remove(event.price).is_none() {
                debug!(symbol, side = ?side.side(), price = %event.price, "Delete for absent level");
            }
        }
    }
}

fn aggregate(events: &[OrderEvent]) -> Vec<PriceLevel> {
    let mut levels: BTreeMap<Decimal, Decimal> = BTreeMap::new();
    for event in events {
        if event.kind != OrderEventKind::Delete {
            *levels.entry(event.price).or_default() += event.volume;
        }
    }
    levels
        .into_iter()
        .map(|(price, volume)| PriceLevel { price, volume })
        .collect()
}
