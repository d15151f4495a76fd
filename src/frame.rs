//! Frame decoding.
//!
//! Kraken market data frames are positional JSON arrays rather than a
//! uniform envelope:
//!
//! - `[payload, channelName, sequence]` for private channels
//! - `[channelID, payload, channelName, pair]` for public channels
//! - `[channelID, askPayload, bidPayload, channelName, pair]` when a book
//!   update carries both sides
//!
//! Control frames are JSON objects with either an `event` field
//! ([`SystemEvent`]) or a `channel` field ([`ChannelMessage`]).

use serde_json::{Map, Value, json};

use crate::models::{ChannelMessage, SystemEvent};
use crate::{FeedError, Result};

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Event),
    Envelope(Envelope),
}

/// An object-shaped frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    System(SystemEvent),
    Channel(ChannelMessage),
}

/// A positional market data frame with its routing metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub channel_id: Option<i64>,
    /// Channel-specific payload, decoded later by the payload typer.
    pub payload: Value,
    pub channel_name: String,
    pub pair: Option<String>,
    pub sequence: Option<i64>,
}

impl Envelope {
    /// Re-encodes the envelope in its wire shape.
    ///
    /// Envelopes with a channel ID produce the 4-element form; the rest
    /// produce the 3-element form with an object-wrapped sequence.
    pub fn to_value(&self) -> Value {
        match self.channel_id {
            Some(id) => json!([id, self.payload, self.channel_name, self.pair]),
            None => json!([
                self.payload,
                self.channel_name,
                { "sequence": self.sequence }
            ]),
        }
    }
}

/// Decodes one raw text frame.
///
/// # Errors
///
/// Returns [`FeedError::MalformedFrame`] if the text is not JSON, or the
/// JSON matches none of the recognized shapes.
pub fn decode_frame(text: &str) -> Result<Frame> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| FeedError::MalformedFrame(format!("invalid json: {e}")))?;
    decode_value(value)
}

/// Decodes an already-parsed frame.
pub fn decode_value(value: Value) -> Result<Frame> {
    match value {
        Value::Array(items) => decode_envelope(items).map(Frame::Envelope),
        Value::Object(object) => decode_object(object).map(Frame::Event),
        other => Err(FeedError::MalformedFrame(format!(
            "expected an array or an event object, got {other}"
        ))),
    }
}

fn decode_object(object: Map<String, Value>) -> Result<Event> {
    let has_event = object.contains_key("event");
    let has_channel = object.contains_key("channel");
    let value = Value::Object(object);

    if has_event {
        serde_json::from_value(value)
            .map(Event::System)
            .map_err(|e| FeedError::MalformedFrame(format!("event frame: {e}")))
    } else if has_channel {
        serde_json::from_value(value)
            .map(Event::Channel)
            .map_err(|e| FeedError::MalformedFrame(format!("channel frame: {e}")))
    } else {
        Err(FeedError::MalformedFrame(
            "object frame has neither an event nor a channel field".to_string(),
        ))
    }
}

fn decode_envelope(items: Vec<Value>) -> Result<Envelope> {
    let items = match <[Value; 3]>::try_from(items) {
        Ok([payload, channel_name, sequence]) => {
            return Ok(Envelope {
                channel_id: None,
                payload,
                channel_name: channel_name_of(channel_name)?,
                pair: None,
                sequence: Some(sequence_of(&sequence)?),
            });
        }
        Err(items) => items,
    };

    let items = match <[Value; 5]>::try_from(items) {
        Ok([channel_id, ask, bid, channel_name, pair]) => {
            let payload = merge_depth_payloads(ask, bid)?;
            return public_envelope(channel_id, payload, channel_name, pair);
        }
        Err(items) => items,
    };

    match <[Value; 4]>::try_from(items) {
        Ok([channel_id, payload, channel_name, pair]) => {
            public_envelope(channel_id, payload, channel_name, pair)
        }
        Err(items) if items.len() < 3 => Err(FeedError::MalformedFrame(format!(
            "expected at least 3 elements, got {}",
            items.len()
        ))),
        Err(items) => Err(FeedError::MalformedFrame(format!(
            "unsupported array length {}",
            items.len()
        ))),
    }
}

fn public_envelope(
    channel_id: Value,
    payload: Value,
    channel_name: Value,
    pair: Value,
) -> Result<Envelope> {
    let channel_id = channel_id
        .as_i64()
        .ok_or_else(|| FeedError::MalformedFrame(format!("channel id: {channel_id}")))?;
    let pair = match pair {
        Value::String(pair) => pair,
        other => return Err(FeedError::MalformedFrame(format!("pair: {other}"))),
    };

    Ok(Envelope {
        channel_id: Some(channel_id),
        payload,
        channel_name: channel_name_of(channel_name)?,
        pair: Some(pair),
        sequence: None,
    })
}

fn channel_name_of(value: Value) -> Result<String> {
    match value {
        Value::String(name) => Ok(name),
        other => Err(FeedError::MalformedFrame(format!("channel name: {other}"))),
    }
}

/// Accepts both `101` and `{"sequence": 101}`.
fn sequence_of(value: &Value) -> Result<i64> {
    value
        .as_i64()
        .or_else(|| value.get("sequence").and_then(Value::as_i64))
        .ok_or_else(|| FeedError::MalformedFrame(format!("sequence: {value}")))
}

/// Merges the ask and bid objects of a two-sided book update into one
/// object.
///
/// # Errors
///
/// Returns [`FeedError::MalformedFrame`] if either side is not an object or
/// the two objects share a key.
pub fn merge_depth_payloads(ask: Value, bid: Value) -> Result<Value> {
    let (Value::Object(mut merged), Value::Object(bid)) = (ask, bid) else {
        return Err(FeedError::MalformedFrame(
            "depth update: ask and bid payloads must both be objects".to_string(),
        ));
    };

    for (key, value) in bid {
        if merged.contains_key(&key) {
            return Err(FeedError::MalformedFrame(format!(
                "depth update: key {key:?} present in both ask and bid payloads"
            )));
        }
        merged.insert(key, value);
    }

    Ok(Value::Object(merged))
}
