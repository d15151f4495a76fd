//! Kraken WebSocket market data decoder.
//!
//! Raw text frames flow through four stages:
//!
//! 1. [`frame`] recognizes the positional array or object shape and pulls
//!    out channel, pair and sequence.
//! 2. [`payload`] types the payload by channel name.
//! 3. [`book`] applies book payloads to per-symbol replicas verified by the
//!    exchange checksum.
//! 4. [`bus`] hands typed updates to the consumer in arrival order.
//!
//! [`websocket::FeedProcessor`] wires the stages together over a
//! [`websocket::Transport`].

pub mod book;
pub mod bus;
pub mod config;
pub mod error;
pub mod frame;
pub mod models;
pub mod payload;
pub mod websocket;

pub use error::{FeedError, Result};
