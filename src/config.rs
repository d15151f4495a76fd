//! Feed configuration loaded from environment variables.
//!
//! All variables are optional:
//! - `KRAKEN_WEBSOCKET_URL`: public endpoint (default `wss://ws.kraken.com`)
//! - `KRAKEN_BOOK_DEPTH`: levels kept per side of each replica (default 10)
//! - `KRAKEN_CHECKSUM_LEVELS`: levels per side covered by the checksum (default 10)
//! - `KRAKEN_BUS_CAPACITY`: bounded update bus size (default 1024)

use crate::book::BookParams;
use crate::{FeedError, Result};

/// Default public WebSocket endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://ws.kraken.com";

/// Default replica depth.
const DEFAULT_BOOK_DEPTH: usize = 10;

/// Number of levels per side the exchange checksums.
const DEFAULT_CHECKSUM_LEVELS: usize = 10;

const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Book depths the exchange accepts on subscription.
pub const VALID_BOOK_DEPTHS: [usize; 5] = [10, 25, 100, 500, 1000];

/// Top-level feed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub websocket_url: String,
    pub book_depth: usize,
    pub checksum_levels: usize,
    pub bus_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            websocket_url: DEFAULT_WEBSOCKET_URL.to_string(),
            book_depth: DEFAULT_BOOK_DEPTH,
            checksum_levels: DEFAULT_CHECKSUM_LEVELS,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl FeedConfig {
    /// Default parameters for newly created order book replicas.
    pub fn book_params(&self) -> BookParams {
        BookParams {
            depth: self.book_depth,
            checksum_levels: self.checksum_levels,
            price_precision: None,
            volume_precision: None,
        }
    }
}

/// Loads the feed configuration from environment variables.
///
/// # Errors
///
/// Returns [`FeedError::Config`] if a numeric variable does not parse, the
/// book depth is not one the exchange supports, the checksum covers more
/// levels than the book keeps, or the bus capacity is zero.
pub fn fetch_config() -> Result<FeedConfig> {
    let websocket_url = non_empty_var("KRAKEN_WEBSOCKET_URL")
        .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.to_string());
    let book_depth = usize_var("KRAKEN_BOOK_DEPTH", DEFAULT_BOOK_DEPTH)?;
    let checksum_levels = usize_var("KRAKEN_CHECKSUM_LEVELS", DEFAULT_CHECKSUM_LEVELS)?;
    let bus_capacity = usize_var("KRAKEN_BUS_CAPACITY", DEFAULT_BUS_CAPACITY)?;

    if !VALID_BOOK_DEPTHS.contains(&book_depth) {
        return Err(FeedError::Config(format!(
            "KRAKEN_BOOK_DEPTH must be one of {VALID_BOOK_DEPTHS:?}, got {book_depth}"
        )));
    }
    if checksum_levels == 0 || checksum_levels > book_depth {
        return Err(FeedError::Config(format!(
            "KRAKEN_CHECKSUM_LEVELS must be between 1 and {book_depth}, got {checksum_levels}"
        )));
    }
    if bus_capacity == 0 {
        return Err(FeedError::Config(
            "KRAKEN_BUS_CAPACITY must be at least 1".to_string(),
        ));
    }

    Ok(FeedConfig {
        websocket_url,
        book_depth,
        checksum_levels,
        bus_capacity,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn usize_var(name: &str, default: usize) -> Result<usize> {
    match non_empty_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| FeedError::Config(format!("{name} is not a valid number: {raw:?}"))),
        None => Ok(default),
    }
}
