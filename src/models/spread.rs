//! Spread channel models.

use rust_decimal::Decimal;
use serde_json::Value;

use super::positional::{decimal, fixed_array};
use crate::Result;

/// Best bid/ask snapshot:
/// `[bid, ask, timestamp, bidVolume, askVolume]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spread {
    pub bid: Decimal,
    pub ask: Decimal,
    pub time: Decimal,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
}

impl Spread {
    pub fn from_array(value: &Value) -> Result<Self> {
        let [bid, ask, time, bid_volume, ask_volume] = fixed_array::<5>(value, "spread")?;
        Ok(Self {
            bid: decimal(bid, "spread.bid")?,
            ask: decimal(ask, "spread.ask")?,
            time: decimal(time, "spread.time")?,
            bid_volume: decimal(bid_volume, "spread.bid_volume")?,
            ask_volume: decimal(ask_volume, "spread.ask_volume")?,
        })
    }

    /// Difference between the best ask and the best bid.
    pub fn width(&self) -> Decimal {
        self.ask - self.bid
    }
}
