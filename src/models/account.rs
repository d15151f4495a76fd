//! Private account channel models (`ownTrades` and `openOrders`).
//!
//! Both payloads are arrays of single-entry maps keyed by transaction ID:
//! `[{"TDLH43-DVQXD-2KHVYY": {...}}, ...]`. The maps are flattened here
//! with the key copied into the record.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{FeedError, Result};

/// One of the account's own trades.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnTrade {
    /// Trade ID (the map key on the wire).
    #[serde(skip)]
    pub trade_id: String,
    #[serde(rename = "ordertxid")]
    pub order_id: String,
    #[serde(rename = "postxid", default)]
    pub position_id: Option<String>,
    pub pair: String,
    pub time: Decimal,
    /// `"buy"` or `"sell"`.
    #[serde(rename = "type")]
    pub side: String,
    #[serde(rename = "ordertype")]
    pub order_type: String,
    pub price: Decimal,
    pub cost: Decimal,
    pub fee: Decimal,
    pub vol: Decimal,
    #[serde(default)]
    pub margin: Option<Decimal>,
    #[serde(default)]
    pub userref: Option<i64>,
}

/// Human-readable order description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenOrderDescr {
    pub pair: String,
    #[serde(rename = "type")]
    pub side: String,
    #[serde(rename = "ordertype")]
    pub order_type: String,
    pub price: Decimal,
    pub price2: Decimal,
    #[serde(default)]
    pub leverage: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
}

/// An open order. Status-change updates carry only a subset of fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenOrder {
    /// Order ID (the map key on the wire).
    #[serde(skip)]
    pub order_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub descr: Option<OpenOrderDescr>,
    #[serde(default)]
    pub refid: Option<String>,
    #[serde(default)]
    pub userref: Option<i64>,
    #[serde(rename = "opentm", default)]
    pub open_time: Option<Decimal>,
    #[serde(rename = "starttm", default)]
    pub start_time: Option<Decimal>,
    #[serde(rename = "expiretm", default)]
    pub expire_time: Option<Decimal>,
    #[serde(default)]
    pub vol: Option<Decimal>,
    #[serde(default)]
    pub vol_exec: Option<Decimal>,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub fee: Option<Decimal>,
    /// Average fill price.
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(rename = "stopprice", default)]
    pub stop_price: Option<Decimal>,
    #[serde(rename = "limitprice", default)]
    pub limit_price: Option<Decimal>,
    #[serde(default)]
    pub misc: Option<String>,
    #[serde(default)]
    pub oflags: Option<String>,
}

impl OwnTrade {
    pub fn list_from_payload(value: &Value) -> Result<Vec<Self>> {
        flatten_keyed(value, "ownTrades", |id, trade: &mut OwnTrade| {
            trade.trade_id = id;
        })
    }
}

impl OpenOrder {
    pub fn list_from_payload(value: &Value) -> Result<Vec<Self>> {
        flatten_keyed(value, "openOrders", |id, order: &mut OpenOrder| {
            order.order_id = id;
        })
    }
}

fn flatten_keyed<T, F>(value: &Value, what: &str, mut set_id: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(String, &mut T),
{
    let maps: Vec<BTreeMap<String, T>> = serde_json::from_value(value.clone())
        .map_err(|e| FeedError::SchemaMismatch(format!("{what}: {e}")))?;

    let mut records = Vec::new();
    for map in maps {
        for (id, mut record) in map {
            set_id(id, &mut record);
            records.push(record);
        }
    }
    Ok(records)
}
