//! Trade channel models.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::positional::{array, decimal, fixed_array, string};
use crate::{FeedError, Result};

/// A single executed trade:
/// `[price, volume, time, side, orderType, misc]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub price: Decimal,
    pub volume: Decimal,
    /// Seconds since epoch with microsecond fraction.
    pub time: Decimal,
    pub side: TradeSide,
    pub order_type: TradeOrderType,
    pub misc: String,
}

/// A trade from an object-shaped `trade` channel message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeEvent {
    pub symbol: String,
    /// Taker direction: `"buy"` or `"sell"`.
    pub side: String,
    pub price: Decimal,
    pub qty: Decimal,
    /// `"market"` or `"limit"`.
    pub ord_type: String,
    pub trade_id: u64,
    /// RFC 3339 execution time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOrderType {
    Market,
    Limit,
}

impl Trade {
    /// Decodes the trade payload, which is an array of trade arrays.
    pub fn list_from_payload(value: &Value) -> Result<Vec<Self>> {
        array(value, "trade")?.iter().map(Self::from_array).collect()
    }

    pub fn from_array(value: &Value) -> Result<Self> {
        let [price, volume, time, side, order_type, misc] = fixed_array::<6>(value, "trade")?;
        Ok(Self {
            price: decimal(price, "trade.price")?,
            volume: decimal(volume, "trade.volume")?,
            time: decimal(time, "trade.time")?,
            side: match string(side, "trade.side")? {
                "b" => TradeSide::Buy,
                "s" => TradeSide::Sell,
                other => {
                    return Err(FeedError::SchemaMismatch(format!(
                        "trade.side: unexpected {other:?}"
                    )));
                }
            },
            order_type: match string(order_type, "trade.order_type")? {
                "m" => TradeOrderType::Market,
                "l" => TradeOrderType::Limit,
                other => {
                    return Err(FeedError::SchemaMismatch(format!(
                        "trade.order_type: unexpected {other:?}"
                    )));
                }
            },
            misc: string(misc, "trade.misc")?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_market_buy() {
        let trade = Trade::from_array(&json!([
            "6060.00000",
            "0.02455000",
            "1534614057.324998",
            "b",
            "m",
            ""
        ]))
        .unwrap();
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.order_type, TradeOrderType::Market);
        assert_eq!(trade.volume, dec!(0.02455));
    }

    #[test]
    fn rejects_unknown_side() {
        let err = Trade::from_array(&json!(["1", "1", "1", "x", "l", ""])).unwrap_err();
        assert!(err.to_string().contains("trade.side"));
    }

    #[test]
    fn rejects_short_trade() {
        let err = Trade::list_from_payload(&json!([["1", "1", "1", "b", "l"]])).unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
    }
}
