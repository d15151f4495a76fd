//! Ticker channel models.
//!
//! The ticker payload is an object whose fields are short positional arrays:
//!
//! ```text
//! {"a":["5525.40000",1,"1.000"],"b":["5525.10000",1,"1.000"],
//!  "c":["5525.10000","0.00398963"],"v":["2634.11501494","3591.17907851"],
//!  "p":["5631.44067","5653.78939"],"t":[11493,16267],
//!  "l":["5505.00000","5505.00000"],"h":["5783.00000","5783.00000"],
//!  "o":["5760.70000","5763.40000"]}
//! ```

use rust_decimal::Decimal;
use serde_json::Value;

use super::positional::{decimal, field, fixed_array, integer};
use crate::Result;

/// A ticker update for one trading pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticker {
    pub ask: TickerLevel,
    pub bid: TickerLevel,
    pub close: LastTrade,
    pub volume: DailyDecimal,
    pub vwap: DailyDecimal,
    pub trades: DailyCount,
    pub low: DailyDecimal,
    pub high: DailyDecimal,
    pub open: DailyDecimal,
}

/// Best ask or bid: `[price, whole lot volume, lot volume]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerLevel {
    pub price: Decimal,
    pub whole_lot_volume: i64,
    pub lot_volume: Decimal,
}

/// Last trade closed: `[price, lot volume]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastTrade {
    pub price: Decimal,
    pub lot_volume: Decimal,
}

/// A decimal reported for today and for the last 24 hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDecimal {
    pub today: Decimal,
    pub last_24h: Decimal,
}

/// A count reported for today and for the last 24 hours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCount {
    pub today: i64,
    pub last_24h: i64,
}

impl Ticker {
    /// Decodes a ticker payload object.
    pub fn from_payload(value: &Value) -> Result<Self> {
        Ok(Self {
            ask: TickerLevel::from_array(field(value, "a", "ticker")?, "ticker.a")?,
            bid: TickerLevel::from_array(field(value, "b", "ticker")?, "ticker.b")?,
            close: LastTrade::from_array(field(value, "c", "ticker")?)?,
            volume: DailyDecimal::from_array(field(value, "v", "ticker")?, "ticker.v")?,
            vwap: DailyDecimal::from_array(field(value, "p", "ticker")?, "ticker.p")?,
            trades: DailyCount::from_array(field(value, "t", "ticker")?)?,
            low: DailyDecimal::from_array(field(value, "l", "ticker")?, "ticker.l")?,
            high: DailyDecimal::from_array(field(value, "h", "ticker")?, "ticker.h")?,
            open: DailyDecimal::from_array(field(value, "o", "ticker")?, "ticker.o")?,
        })
    }
}

impl TickerLevel {
    pub fn from_array(value: &Value, what: &str) -> Result<Self> {
        let [price, whole, lot] = fixed_array::<3>(value, what)?;
        Ok(Self {
            price: decimal(price, what)?,
            whole_lot_volume: integer(whole, what)?,
            lot_volume: decimal(lot, what)?,
        })
    }
}

impl LastTrade {
    pub fn from_array(value: &Value) -> Result<Self> {
        let [price, lot] = fixed_array::<2>(value, "ticker.c")?;
        Ok(Self {
            price: decimal(price, "ticker.c")?,
            lot_volume: decimal(lot, "ticker.c")?,
        })
    }
}

impl DailyDecimal {
    pub fn from_array(value: &Value, what: &str) -> Result<Self> {
        let [today, last_24h] = fixed_array::<2>(value, what)?;
        Ok(Self {
            today: decimal(today, what)?,
            last_24h: decimal(last_24h, what)?,
        })
    }
}

impl DailyCount {
    pub fn from_array(value: &Value) -> Result<Self> {
        let [today, last_24h] = fixed_array::<2>(value, "ticker.t")?;
        Ok(Self {
            today: integer(today, "ticker.t")?,
            last_24h: integer(last_24h, "ticker.t")?,
        })
    }
}
