//! Payload typing.
//!
//! Turns the opaque payload of an [`Envelope`] or [`ChannelMessage`] into a
//! [`ChannelPayload`], selected by channel name. Each variant decodes with
//! its own positional or object rule from [`crate::models`].

use serde_json::Value;

use crate::frame::Envelope;
use crate::models::account::{OpenOrder, OwnTrade};
use crate::models::book::{BookDelta, BookPayload, BookSnapshot};
use crate::models::candle::Candle;
use crate::models::orders::OrdersUpdate;
use crate::models::spread::Spread;
use crate::models::ticker::Ticker;
use crate::models::trade::{Trade, TradeEvent};
use crate::models::{Channel, ChannelMessage};
use crate::{FeedError, Result};

/// A fully typed channel payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPayload {
    Ticker(Ticker),
    Trades(Vec<Trade>),
    /// Trades from an object-shaped `trade` channel message.
    TradeEvents(Vec<TradeEvent>),
    Candle(Candle),
    Spread(Spread),
    BookSnapshot(BookSnapshot),
    BookDelta(BookDelta),
    /// Level-3 account order book; `is_snapshot` marks a full replacement.
    AccountOrders(OrdersUpdate),
    AccountTrades(Vec<OwnTrade>),
    OpenOrders(Vec<OpenOrder>),
}

impl ChannelPayload {
    /// Returns `true` for payloads that feed an order book replica.
    pub fn is_book(&self) -> bool {
        matches!(
            self,
            ChannelPayload::BookSnapshot(_)
                | ChannelPayload::BookDelta(_)
                | ChannelPayload::AccountOrders(_)
        )
    }
}

/// Types the payload of a positional frame.
///
/// # Errors
///
/// Returns [`FeedError::UnknownChannel`] for unrecognized channel names and
/// [`FeedError::SchemaMismatch`] when the payload does not fit its channel.
pub fn type_envelope(envelope: &Envelope) -> Result<ChannelPayload> {
    let channel = Channel::from_name(&envelope.channel_name)
        .ok_or_else(|| FeedError::UnknownChannel(envelope.channel_name.clone()))?;
    let payload = &envelope.payload;

    match channel {
        Channel::Ticker => Ticker::from_payload(payload).map(ChannelPayload::Ticker),
        Channel::Trades => Trade::list_from_payload(payload).map(ChannelPayload::Trades),
        Channel::Candles => Candle::from_array(payload).map(ChannelPayload::Candle),
        Channel::Spread => Spread::from_array(payload).map(ChannelPayload::Spread),
        Channel::Book => BookPayload::from_payload(payload).map(|book| match book {
            BookPayload::Snapshot(snapshot) => ChannelPayload::BookSnapshot(snapshot),
            BookPayload::Delta(delta) => ChannelPayload::BookDelta(delta),
        }),
        Channel::OwnTrades => OwnTrade::list_from_payload(payload).map(ChannelPayload::AccountTrades),
        Channel::OpenOrders => OpenOrder::list_from_payload(payload).map(ChannelPayload::OpenOrders),
        Channel::Orders | Channel::Heartbeat | Channel::Status => Err(FeedError::SchemaMismatch(
            format!("{}: not carried in positional frames", envelope.channel_name),
        )),
    }
}

/// Types an object-shaped channel message.
///
/// `level3` messages consume only the first element of `data`; `trade`
/// messages consume all of it.
///
/// # Errors
///
/// Returns [`FeedError::SchemaMismatch`] if `type` is neither `"snapshot"`
/// nor `"update"`, a `level3` message has no data, or an entry does not
/// decode, and [`FeedError::UnknownChannel`] for any other channel.
pub fn type_channel_message(message: &ChannelMessage) -> Result<ChannelPayload> {
    match Channel::from_name(&message.channel) {
        Some(Channel::Orders) => type_orders_message(message).map(ChannelPayload::AccountOrders),
        Some(Channel::Trades) => type_trades_message(message).map(ChannelPayload::TradeEvents),
        _ => Err(FeedError::UnknownChannel(message.channel.clone())),
    }
}

/// `true` for `"snapshot"`, `false` for `"update"`.
fn is_snapshot(message: &ChannelMessage) -> Result<bool> {
    match message.tpe.as_deref() {
        Some("snapshot") => Ok(true),
        Some("update") => Ok(false),
        other => Err(FeedError::SchemaMismatch(format!(
            "{}: unexpected message type {other:?}",
            message.channel
        ))),
    }
}

fn type_orders_message(message: &ChannelMessage) -> Result<OrdersUpdate> {
    let is_snapshot = is_snapshot(message)?;

    let first = message
        .data
        .as_array()
        .and_then(|data| data.first())
        .ok_or_else(|| {
            FeedError::SchemaMismatch(format!("{}: message carries no data", message.channel))
        })?;

    let mut update: OrdersUpdate = serde_json::from_value(Value::clone(first))
        .map_err(|e| FeedError::SchemaMismatch(format!("{}: {e}", message.channel)))?;
    update.is_snapshot = is_snapshot;

    Ok(update)
}

fn type_trades_message(message: &ChannelMessage) -> Result<Vec<TradeEvent>> {
    is_snapshot(message)?;
    serde_json::from_value(message.data.clone())
        .map_err(|e| FeedError::SchemaMismatch(format!("{}: {e}", message.channel)))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::models::book::OrderEventKind;
    use crate::models::trade::{TradeOrderType, TradeSide};

    fn env(channel_name: &str, payload: Value) -> Envelope {
        Envelope {
            channel_id: Some(42),
            payload,
            channel_name: channel_name.to_string(),
            pair: Some("XBT/USD".to_string()),
            sequence: None,
        }
    }

    fn message(tpe: &str, data: Value) -> ChannelMessage {
        channel_message("level3", tpe, data)
    }

    fn channel_message(channel: &str, tpe: &str, data: Value) -> ChannelMessage {
        ChannelMessage {
            channel: channel.to_string(),
            tpe: Some(tpe.to_string()),
            data,
        }
    }

    #[test]
    fn types_ticker() {
        let payload = json!({
            "a": ["5525.40000", 1, "1.000"],
            "b": ["5525.10000", 1, "1.000"],
            "c": ["5525.10000", "0.00398963"],
            "v": ["2634.11501494", "3591.17907851"],
            "p": ["5631.44067", "5653.78939"],
            "t": [11493, 16267],
            "l": ["5505.00000", "5505.00000"],
            "h": ["5783.00000", "5783.00000"],
            "o": ["5760.70000", "5763.40000"]
        });
        let ChannelPayload::Ticker(ticker) = type_envelope(&env("ticker", payload)).unwrap() else {
            panic!("expected ticker");
        };
        assert_eq!(ticker.ask.price, dec!(5525.4));
        assert_eq!(ticker.ask.whole_lot_volume, 1);
        assert_eq!(ticker.close.lot_volume, dec!(0.00398963));
        assert_eq!(ticker.trades.last_24h, 16267);
        assert_eq!(ticker.open.today, dec!(5760.7));
    }

    #[test]
    fn ticker_with_short_level_is_schema_mismatch() {
        let payload = json!({"a": ["5525.4", 1], "b": [], "c": [], "v": [], "p": [],
            "t": [], "l": [], "h": [], "o": []});
        let err = type_envelope(&env("ticker", payload)).unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
    }

    #[test]
    fn types_trades() {
        let payload = json!([
            ["5541.20000", "0.15850568", "1534614057.321597", "s", "l", ""],
            ["6060.00000", "0.02455000", "1534614057.324998", "b", "m", ""]
        ]);
        let ChannelPayload::Trades(trades) = type_envelope(&env("trade", payload)).unwrap() else {
            panic!("expected trades");
        };
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, TradeSide::Sell);
        assert_eq!(trades[0].order_type, TradeOrderType::Limit);
        assert_eq!(trades[1].price, dec!(6060));
        assert_eq!(trades[1].time, dec!(1534614057.324998));
    }

    #[test]
    fn trade_with_unknown_side_is_rejected() {
        let payload = json!([["1", "1", "1", "x", "l", ""]]);
        assert!(type_envelope(&env("trade", payload)).is_err());
    }

    #[test]
    fn types_candle() {
        let payload = json!([
            "1542057314.748456", "1542057360.435743", "3586.70000", "3586.70000",
            "3586.60000", "3586.60000", "3586.68894", "0.03373000", 2
        ]);
        let ChannelPayload::Candle(candle) = type_envelope(&env("ohlc-5", payload)).unwrap() else {
            panic!("expected candle");
        };
        assert_eq!(candle.open, dec!(3586.7));
        assert_eq!(candle.low, dec!(3586.6));
        assert_eq!(candle.vwap, dec!(3586.68894));
        assert_eq!(candle.count, 2);
    }

    #[test]
    fn candle_with_wrong_arity_is_schema_mismatch() {
        let payload = json!(["1", "2", "3"]);
        let err = type_envelope(&env("ohlc-1", payload)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "schema mismatch: ohlc: expected 9 fields, got 3"
        );
    }

    #[test]
    fn types_spread() {
        let payload = json!([
            "5698.40000", "5700.00000", "1542057299.545897", "1.01234567", "0.98765432"
        ]);
        let ChannelPayload::Spread(spread) = type_envelope(&env("spread", payload)).unwrap() else {
            panic!("expected spread");
        };
        assert_eq!(spread.bid, dec!(5698.4));
        assert_eq!(spread.bid_volume, dec!(1.01234567));
        assert_eq!(spread.ask_volume, dec!(0.98765432));
        assert_eq!(spread.width(), dec!(1.6));
    }

    #[test]
    fn types_book_snapshot_and_delta() {
        let snapshot = json!({
            "as": [["5541.30000", "2.50700000", "1534614248.123678"]],
            "bs": [["5541.20000", "1.52900000", "1534614248.765567"]]
        });
        let ChannelPayload::BookSnapshot(snapshot) =
            type_envelope(&env("book-10", snapshot)).unwrap()
        else {
            panic!("expected snapshot");
        };
        assert_eq!(snapshot.asks[0].price, dec!(5541.3));
        assert_eq!(snapshot.bids[0].volume, dec!(1.529));

        let delta = json!({
            "a": [["5541.30000", "0.00000000", "1534614335.345903"]],
            "b": [["5541.20000", "0.40100000", "1534614335.345903", "r"]],
            "c": "974942666"
        });
        let ChannelPayload::BookDelta(delta) = type_envelope(&env("book-10", delta)).unwrap()
        else {
            panic!("expected delta");
        };
        assert_eq!(delta.checksum, Some(974942666));
        assert_eq!(delta.asks[0].kind, OrderEventKind::Delete);
        assert_eq!(delta.bids[0].kind, OrderEventKind::Modify);
        assert_eq!(delta.bids[0].volume, dec!(0.401));
    }

    #[test]
    fn book_level_with_wrong_arity_is_schema_mismatch() {
        let delta = json!({"a": [["5541.3", "1"]], "c": "1"});
        let err = type_envelope(&env("book-10", delta)).unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
    }

    #[test]
    fn types_own_trades() {
        let payload = json!([{
            "TDLH43-DVQXD-2KHVYY": {
                "cost": "1000000.00000", "fee": "1600.00000", "margin": "0.00000",
                "ordertxid": "TDLH43-DVQXD-2KHVYY", "ordertype": "limit",
                "pair": "XBT/EUR", "postxid": "OGTT3Y-C6I3P-XRI6HX",
                "price": "100000.00000", "time": "1560516023.070651",
                "type": "sell", "vol": "1000000000.00000000"
            }
        }]);
        let ChannelPayload::AccountTrades(trades) =
            type_envelope(&env("ownTrades", payload)).unwrap()
        else {
            panic!("expected own trades");
        };
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].trade_id, "TDLH43-DVQXD-2KHVYY");
        assert_eq!(trades[0].side, "sell");
        assert_eq!(trades[0].fee, dec!(1600));
    }

    #[test]
    fn types_open_orders_status_update() {
        let payload = json!([{ "OGTT3Y-C6I3P-XRI6HX": { "status": "closed" } }]);
        let ChannelPayload::OpenOrders(orders) =
            type_envelope(&env("openOrders", payload)).unwrap()
        else {
            panic!("expected open orders");
        };
        assert_eq!(orders[0].order_id, "OGTT3Y-C6I3P-XRI6HX");
        assert_eq!(orders[0].status.as_deref(), Some("closed"));
        assert!(orders[0].descr.is_none());
    }

    #[test]
    fn unknown_channel_is_reported() {
        let err = type_envelope(&env("mystery", json!({}))).unwrap_err();
        assert!(matches!(err, FeedError::UnknownChannel(name) if name == "mystery"));
    }

    #[test]
    fn types_level3_snapshot_and_update() {
        let data = json!([{
            "symbol": "BTC/USD",
            "bids": [{"order_id": "O1", "limit_price": 100.5, "order_qty": 2.0,
                      "timestamp": "2024-01-15T10:30:00.123456Z"}],
            "asks": [],
            "checksum": 123456
        }]);
        let ChannelPayload::AccountOrders(snapshot) =
            type_channel_message(&message("snapshot", data.clone())).unwrap()
        else {
            panic!("expected account orders");
        };
        assert!(snapshot.is_snapshot);
        assert_eq!(snapshot.bids[0].kind, OrderEventKind::Add);
        assert_eq!(snapshot.bids[0].price, dec!(100.5));

        let ChannelPayload::AccountOrders(update) =
            type_channel_message(&message("update", data)).unwrap()
        else {
            panic!("expected account orders");
        };
        assert!(!update.is_snapshot);
        assert_eq!(update.checksum, 123456);
    }

    #[test]
    fn level3_without_data_is_schema_mismatch() {
        let err = type_channel_message(&message("snapshot", json!([]))).unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
    }

    #[test]
    fn level3_with_unknown_type_is_schema_mismatch() {
        let err = type_channel_message(&message("partial", json!([{}]))).unwrap_err();
        assert!(err.to_string().contains("unexpected message type"));
    }

    #[test]
    fn types_trade_channel_message() {
        let data = json!([
            {"symbol": "BTC/USD", "side": "sell", "price": 42150.5, "qty": 0.25,
             "ord_type": "market", "trade_id": 74391, "timestamp": "2024-01-15T10:30:00.123456Z"},
            {"symbol": "BTC/USD", "side": "buy", "price": "42151.0", "qty": "0.5",
             "ord_type": "limit", "trade_id": 74392, "timestamp": "2024-01-15T10:30:00.223456Z"}
        ]);
        let ChannelPayload::TradeEvents(trades) =
            type_channel_message(&channel_message("trade", "update", data)).unwrap()
        else {
            panic!("expected trade events");
        };
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, dec!(42150.5));
        assert_eq!(trades[0].qty, dec!(0.25));
        assert_eq!(trades[1].ord_type, "limit");
        assert_eq!(trades[1].trade_id, 74392);
    }

    #[test]
    fn trade_message_with_missing_field_is_schema_mismatch() {
        let data = json!([{"symbol": "BTC/USD", "side": "buy"}]);
        let err = type_channel_message(&channel_message("trade", "snapshot", data)).unwrap_err();
        assert!(matches!(err, FeedError::SchemaMismatch(_)));
    }

    #[test]
    fn other_channel_messages_are_unknown() {
        let err = type_channel_message(&channel_message("ticker", "update", json!([])))
            .unwrap_err();
        assert!(matches!(err, FeedError::UnknownChannel(name) if name == "ticker"));
    }
}
