//! Order book channel models.
//!
//! A `book-<depth>` payload is either a snapshot (`as`/`bs` keys) or a
//! delta (`a`/`b` keys plus a `c` checksum). Each level is
//! `[price, volume, timestamp]`, optionally followed by `"r"` when the
//! exchange republishes a level that re-entered the subscribed depth.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::positional::{array, decimal, integer, string};
use crate::{FeedError, Result};

/// Which side of the book a level or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

/// A single price level in the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLevel {
    pub price: Decimal,
    pub volume: Decimal,
}

/// A price level as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub volume: Decimal,
    pub timestamp: Decimal,
    /// Level was republished after re-entering the subscribed depth.
    pub republish: bool,
}

/// The kind of mutation an [`OrderEvent`] applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderEventKind {
    /// Snapshot entries carry no event and are treated as adds.
    #[default]
    Add,
    Modify,
    Delete,
}

/// The unit of book mutation.
///
/// Deserializes from the level-3 wire shape (`event`, `limit_price`,
/// `order_qty`, `order_id`, `timestamp`); book-channel deltas are converted
/// from [`BookLevel`]s.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "event", default)]
    pub kind: OrderEventKind,
    #[serde(rename = "limit_price")]
    pub price: Decimal,
    #[serde(rename = "order_qty")]
    pub volume: Decimal,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub order_id: Option<String>,
}

impl From<&BookLevel> for OrderEvent {
    /// A zero volume deletes the level; anything else sets it.
    fn from(level: &BookLevel) -> Self {
        let kind = if level.volume.is_zero() {
            OrderEventKind::Delete
        } else {
            OrderEventKind::Modify
        };
        Self {
            kind,
            price: level.price,
            volume: level.volume,
            timestamp: level.timestamp.to_string(),
            order_id: None,
        }
    }
}

/// Full replacement of both sides of a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSnapshot {
    pub asks: Vec<BookLevel>,
    pub bids: Vec<BookLevel>,
}

/// Incremental changes to a book, verified against `checksum`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDelta {
    pub asks: Vec<OrderEvent>,
    pub bids: Vec<OrderEvent>,
    /// CRC32 of the top of book after applying this delta.
    pub checksum: Option<u32>,
}

/// A decoded `book-<depth>` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookPayload {
    Snapshot(BookSnapshot),
    Delta(BookDelta),
}

impl BookPayload {
    pub fn from_payload(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| FeedError::SchemaMismatch("book: expected an object".to_string()))?;

        if object.contains_key("as") || object.contains_key("bs") {
            return Ok(Self::Snapshot(BookSnapshot {
                asks: levels(value.get("as"), "book.as")?,
                bids: levels(value.get("bs"), "book.bs")?,
            }));
        }

        if !object.contains_key("a") && !object.contains_key("b") {
            return Err(FeedError::SchemaMismatch(
                "book: neither snapshot nor delta keys present".to_string(),
            ));
        }

        let checksum = value.get("c").map(parse_checksum).transpose()?;
        let asks = levels(value.get("a"), "book.a")?;
        let bids = levels(value.get("b"), "book.b")?;

        Ok(Self::Delta(BookDelta {
            asks: asks.iter().map(OrderEvent::from).collect(),
            bids: bids.iter().map(OrderEvent::from).collect(),
            checksum,
        }))
    }
}

impl BookLevel {
    /// Decodes `[price, volume, timestamp]` or `[price, volume, timestamp, "r"]`.
    pub fn from_array(value: &Value, what: &str) -> Result<Self> {
        let items = array(value, what)?;
        let republish = match items {
            [_, _, _] => false,
            [_, _, _, marker] => string(marker, what)? == "r",
            _ => {
                return Err(FeedError::SchemaMismatch(format!(
                    "{what}: expected 3 or 4 fields, got {}",
                    items.len()
                )));
            }
        };
        Ok(Self {
            price: decimal(&items[0], what)?,
            volume: decimal(&items[1], what)?,
            timestamp: decimal(&items[2], what)?,
            republish,
        })
    }
}

fn levels(value: Option<&Value>, what: &str) -> Result<Vec<BookLevel>> {
    match value {
        Some(value) => array(value, what)?
            .iter()
            .map(|level| BookLevel::from_array(level, what))
            .collect(),
        None => Ok(Vec::new()),
    }
}

fn parse_checksum(value: &Value) -> Result<u32> {
    let raw = integer(value, "book.c")?;
    u32::try_from(raw)
        .map_err(|_| FeedError::SchemaMismatch(format!("book.c: checksum out of range: {raw}")))
}
