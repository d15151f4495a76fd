//! One side of a price-level order book.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::book::{PriceLevel, Side};

/// Price levels for one side of a book, bounded by `depth`.
///
/// - Bids iterate **descending** by price (best bid first).
/// - Asks iterate **ascending** by price (best ask first).
///
/// Prices are unique keys. Inserting beyond `depth` evicts the worst level
/// (lowest bid / highest ask).
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    depth: usize,
    levels: BTreeMap<Decimal, Decimal>,
}

impl BookSide {
    pub fn new(side: Side, depth: usize) -> Self {
        Self {
            side,
            depth,
            levels: BTreeMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Volume resting at `price`, if the level exists.
    pub fn volume_at(&self, price: Decimal) -> Option<Decimal> {
        self.levels.get(&price).copied()
    }

    /// Sets the volume at `price`, inserting the level if it is new.
    ///
    /// A zero volume removes the level instead. Returns the price of a level
    /// evicted to stay within `depth`.
    pub fn upsert(&mut self, price: Decimal, volume: Decimal) -> Option<Decimal> {
        if volume.is_zero() {
            self.levels.remove(&price);
            return None;
        }
        if let Some(existing) = self.levels.get_mut(&price) {
            *existing = volume;
            return None;
        }
        self.levels.insert(price, volume);
        if self.levels.len() > self.depth {
            return self.evict_worst();
        }
        None
    }

    /// Removes the level at `price`, returning its volume.
    pub fn remove(&mut self, price: Decimal) -> Option<Decimal> {
        self.levels.remove(&price)
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn best(&self) -> Option<PriceLevel> {
        self.levels().next()
    }

    /// Levels in priority order, best first.
    pub fn levels(&self) -> Box<dyn Iterator<Item = PriceLevel> + '_> {
        let to_level = |(price, volume): (&Decimal, &Decimal)| PriceLevel {
            price: *price,
            volume: *volume,
        };
        match self.side {
            Side::Bid => Box::new(self.levels.iter().rev().map(to_level)),
            Side::Ask => Box::new(self.levels.iter().map(to_level)),
        }
    }

    /// The best `n` levels, best first.
    pub fn top(&self, n: usize) -> Vec<PriceLevel> {
        self.levels().take(n).collect()
    }

    fn evict_worst(&mut self) -> Option<Decimal> {
        let worst = match self.side {
            Side::Bid => self.levels.pop_first(),
            Side::Ask => self.levels.pop_last(),
        };
        worst.map(|(price, _)| price)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn prices(side: &BookSide) -> Vec<Decimal> {
        side.levels().map(|l| l.price).collect()
    }

    #[test]
    fn bids_iterate_best_first() {
        let mut bids = BookSide::new(Side::Bid, 10);
        bids.upsert(dec!(99), dec!(1));
        bids.upsert(dec!(101), dec!(1));
        bids.upsert(dec!(100), dec!(1));
        assert_eq!(prices(&bids), vec![dec!(101), dec!(100), dec!(99)]);
        assert_eq!(bids.best().unwrap().price, dec!(101));
    }

    #[test]
    fn asks_iterate_best_first() {
        let mut asks = BookSide::new(Side::Ask, 10);
        asks.upsert(dec!(103), dec!(1));
        asks.upsert(dec!(101), dec!(1));
        asks.upsert(dec!(102), dec!(1));
        assert_eq!(prices(&asks), vec![dec!(101), dec!(102), dec!(103)]);
    }

    #[test]
    fn upsert_overwrites_existing_price() {
        let mut asks = BookSide::new(Side::Ask, 10);
        asks.upsert(dec!(101.0), dec!(1));
        asks.upsert(dec!(101.00), dec!(4));
        assert_eq!(asks.len(), 1);
        assert_eq!(asks.volume_at(dec!(101)), Some(dec!(4)));
    }

    #[test]
    fn zero_volume_removes_level() {
        let mut bids = BookSide::new(Side::Bid, 10);
        bids.upsert(dec!(100), dec!(2));
        assert_eq!(bids.upsert(dec!(100), dec!(0.000)), None);
        assert!(bids.is_empty());
    }

    #[test]
    fn overflow_evicts_lowest_bid() {
        let mut bids = BookSide::new(Side::Bid, 2);
        bids.upsert(dec!(100), dec!(1));
        bids.upsert(dec!(99), dec!(1));
        assert_eq!(bids.upsert(dec!(101), dec!(1)), Some(dec!(99)));
        assert_eq!(prices(&bids), vec![dec!(101), dec!(100)]);
    }

    #[test]
    fn overflow_evicts_highest_ask() {
        let mut asks = BookSide::new(Side::Ask, 2);
        asks.upsert(dec!(101), dec!(1));
        asks.upsert(dec!(102), dec!(1));
        // A worse-than-worst insert evicts itself.
        assert_eq!(asks.upsert(dec!(103), dec!(1)), Some(dec!(103)));
        assert_eq!(prices(&asks), vec![dec!(101), dec!(102)]);
    }

    #[test]
    fn top_is_bounded() {
        let mut asks = BookSide::new(Side::Ask, 10);
        for p in 1..=5 {
            asks.upsert(Decimal::from(p), dec!(1));
        }
        assert_eq!(asks.top(3).len(), 3);
        assert_eq!(asks.top(30).len(), 5);
    }
}
