//! Shared models for Kraken WebSocket messages.
//!
//! Contains channel definitions, system event frames (heartbeat, status,
//! subscription acknowledgements) and the object-shaped channel messages
//! used by account channels. Per-channel market data payloads live in the
//! submodules.

pub mod account;
pub mod book;
pub mod candle;
pub mod orders;
pub mod positional;
pub mod spread;
pub mod ticker;
pub mod trade;

use serde::Deserialize;
use serde_json::Value;

/// Available Kraken WebSocket channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Ticker,
    Trades,
    /// OHLC candlestick data (wire name: `"ohlc-<interval>"`).
    Candles,
    Spread,
    /// Aggregated price levels (wire name: `"book-<depth>"`).
    Book,
    /// Account level-3 order book (wire name: `"level3"`).
    Orders,
    OwnTrades,
    OpenOrders,
    Heartbeat,
    Status,
}

impl Channel {
    /// Returns the wire-format channel name prefix used by the Kraken API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Ticker => "ticker",
            Channel::Trades => "trade",
            Channel::Candles => "ohlc",
            Channel::Spread => "spread",
            Channel::Book => "book",
            Channel::Orders => "level3",
            Channel::OwnTrades => "ownTrades",
            Channel::OpenOrders => "openOrders",
            Channel::Heartbeat => "heartbeat",
            Channel::Status => "status",
        }
    }

    /// Resolves a wire channel name, including suffixed names such as
    /// `"book-25"` or `"ohlc-5"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let (base, suffix) = match name.split_once('-') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (name, None),
        };
        let channel = match base {
            "ticker" => Channel::Ticker,
            "trade" => Channel::Trades,
            "ohlc" => Channel::Candles,
            "spread" => Channel::Spread,
            "book" => Channel::Book,
            "level3" => Channel::Orders,
            "ownTrades" => Channel::OwnTrades,
            "openOrders" => Channel::OpenOrders,
            "heartbeat" => Channel::Heartbeat,
            "status" => Channel::Status,
            _ => return None,
        };
        match (channel, suffix) {
            (Channel::Book | Channel::Candles, Some(s)) if s.parse::<u32>().is_ok() => {
                Some(channel)
            }
            (_, None) => Some(channel),
            _ => None,
        }
    }

    /// Depth encoded in a `"book-<depth>"` channel name.
    pub fn book_depth(name: &str) -> Option<usize> {
        name.strip_prefix("book-")?.parse().ok()
    }
}

/// Object-shaped control frames carrying an `event` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SystemEvent {
    Heartbeat,
    Pong {
        #[serde(default)]
        reqid: Option<i64>,
    },
    SystemStatus(SystemStatus),
    SubscriptionStatus(SubscriptionStatus),
    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(default)]
        error_message: String,
        #[serde(default)]
        reqid: Option<i64>,
    },
    /// Any event name this crate does not model.
    #[serde(other)]
    Unknown,
}

/// Exchange status broadcast on connect and on change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemStatus {
    #[serde(rename = "connectionID", default)]
    pub connection_id: Option<u64>,
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Acknowledgement (or rejection) of a subscribe/unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(rename = "channelID", default)]
    pub channel_id: Option<i64>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub pair: Option<String>,
    /// `"subscribed"`, `"unsubscribed"` or `"error"`.
    pub status: String,
    #[serde(default)]
    pub subscription: Option<SubscriptionInfo>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub reqid: Option<i64>,
}

/// Subscription parameters echoed back in a [`SubscriptionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubscriptionInfo {
    pub name: String,
    #[serde(default)]
    pub depth: Option<usize>,
    #[serde(default)]
    pub interval: Option<u32>,
}

impl SubscriptionStatus {
    pub fn is_subscribed(&self) -> bool {
        self.status == "subscribed"
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.status == "unsubscribed"
    }

    /// Returns `true` when this acknowledgement concerns a book channel.
    pub fn is_book(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.name == Channel::Book.as_str())
            || self
                .channel_name
                .as_deref()
                .is_some_and(|name| Channel::from_name(name) == Some(Channel::Book))
    }

    /// Book depth from the echoed subscription, falling back to the
    /// channel name suffix.
    pub fn book_depth(&self) -> Option<usize> {
        self.subscription
            .as_ref()
            .and_then(|s| s.depth)
            .or_else(|| self.channel_name.as_deref().and_then(Channel::book_depth))
    }
}

/// Object-shaped channel message: `{"channel", "type", "data"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    #[serde(rename = "type", default)]
    pub tpe: Option<String>,
    #[serde(default)]
    pub data: Value,
}
