//! OHLC candlestick channel models.

use rust_decimal::Decimal;
use serde_json::Value;

use super::positional::{decimal, fixed_array, integer};
use crate::Result;

/// A single OHLC bar:
/// `[time, etime, open, high, low, close, vwap, volume, count]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    /// Time of the last update within the interval.
    pub time: Decimal,
    /// End time of the interval.
    pub end_time: Decimal,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Volume-weighted average price for this candle.
    pub vwap: Decimal,
    pub volume: Decimal,
    pub count: i64,
}

impl Candle {
    pub fn from_array(value: &Value) -> Result<Self> {
        let [time, end_time, open, high, low, close, vwap, volume, count] =
            fixed_array::<9>(value, "ohlc")?;
        Ok(Self {
            time: decimal(time, "ohlc.time")?,
            end_time: decimal(end_time, "ohlc.etime")?,
            open: decimal(open, "ohlc.open")?,
            high: decimal(high, "ohlc.high")?,
            low: decimal(low, "ohlc.low")?,
            close: decimal(close, "ohlc.close")?,
            vwap: decimal(vwap, "ohlc.vwap")?,
            volume: decimal(volume, "ohlc.volume")?,
            count: integer(count, "ohlc.count")?,
        })
    }
}
