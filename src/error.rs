//! Crate-level error types.
//!
//! [`FeedError`] covers both per-frame decode failures (which the processing
//! loop reports and skips) and transport failures (which end the loop). Use
//! [`FeedError::is_frame_local`] to tell the two apart.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The frame matches none of the recognized array or object shapes.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The payload does not have the arity or fields its channel requires.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The channel name is not one the payload typer knows.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// A replica's recomputed checksum disagrees with the server's value.
    #[error("checksum mismatch for {symbol}: expected {expected}, computed {computed}")]
    ChecksumMismatch {
        symbol: String,
        expected: u32,
        computed: u32,
    },

    /// Environment configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Every update receiver has been dropped.
    #[error("update bus closed")]
    BusClosed,
}

impl FeedError {
    /// Returns `true` for errors scoped to a single frame, after which
    /// processing continues with the next frame.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            FeedError::MalformedFrame(_)
                | FeedError::SchemaMismatch(_)
                | FeedError::UnknownChannel(_)
                | FeedError::ChecksumMismatch { .. }
        )
    }
}
