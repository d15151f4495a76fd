//! Level-3 (account order book) channel models.

use serde::Deserialize;

use super::book::OrderEvent;

/// Order book state for a single trading pair from the `level3` channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrdersUpdate {
    pub symbol: String,
    #[serde(default)]
    pub bids: Vec<OrderEvent>,
    #[serde(default)]
    pub asks: Vec<OrderEvent>,
    /// CRC32 checksum used to verify order book integrity.
    pub checksum: u64,
    /// Set from the message `type`: `true` for `"snapshot"`.
    #[serde(rename = "snapshot", default)]
    pub is_snapshot: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}
