//! Kraken order book checksum.
//!
//! For the top `n` asks (best first) followed by the top `n` bids (best
//! first), the price and then the volume are rendered at the pair's
//! precision with the decimal point removed and leading zeros stripped. The
//! concatenated string is hashed with CRC32.

use rust_decimal::Decimal;

use super::side::BookSide;

/// Fixed rendering precision per pair. `None` keeps the wire scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Precision {
    pub price: Option<u32>,
    pub volume: Option<u32>,
}

/// Computes the checksum over the top `levels` of each side.
pub fn book_checksum(asks: &BookSide, bids: &BookSide, levels: usize, precision: Precision) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = String::new();
    for side in [asks, bids] {
        for level in side.levels().take(levels) {
            buf.clear();
            push_digits(&mut buf, level.price, precision.price);
            push_digits(&mut buf, level.volume, precision.volume);
            hasher.update(buf.as_bytes());
        }
    }
    hasher.finalize()
}

/// `0.05005` at 5 dp becomes `5005`; `1.50000000` becomes `150000000`.
fn push_digits(buf: &mut String, mut value: Decimal, precision: Option<u32>) {
    if let Some(dp) = precision {
        value.rescale(dp);
    }
    let rendered = value.to_string();
    let start = buf.len();
    buf.extend(rendered.chars().filter(|c| *c != '.'));
    let leading = buf[start..].bytes().take_while(|b| *b == b'0').count();
    buf.replace_range(start..start + leading, "");
}
