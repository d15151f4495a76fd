//! Transport seam and the frame processing loop.
//!
//! - [`handler`]: [`FeedProcessor`], decode → type → replica → bus
//! - [`observer`]: hooks for dropped frames, desyncs and system events
//!
//! [`WsTransport`] is the default [`Transport`] over `tokio-tungstenite`.
//! Reconnection, pings and subscription commands stay with the caller.

mod handler;
mod observer;

use std::future::Future;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace};
use tungstenite::Message;

use crate::Result;

pub use handler::FeedProcessor;
pub use observer::{FeedObserver, TracingObserver};

/// Write half of a Kraken WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a Kraken WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A source of raw text frames.
pub trait Transport {
    /// Sends one text frame.
    fn send(&mut self, text: String) -> impl Future<Output = Result<()>> + Send;

    /// Waits for the next text frame. `None` means the peer closed the
    /// connection.
    fn receive(&mut self) -> impl Future<Output = Option<Result<String>>> + Send;

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// [`Transport`] over a live WebSocket connection.
pub struct WsTransport {
    writer: WsWriter,
    reader: WsReader,
}

impl WsTransport {
    pub fn new(writer: WsWriter, reader: WsReader) -> Self {
        Self { writer, reader }
    }

    pub fn into_inner(self) -> (WsWriter, WsReader) {
        (self.writer, self.reader)
    }
}

impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.writer.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Option<Result<String>> {
        while let Some(msg) = self.reader.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    info!(?frame, "WebSocket closed by peer");
                    return None;
                }
                Ok(other) => trace!(kind = ?other, "Skipping non-text frame"),
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<()> {
        self.writer.close().await?;
        debug!("WebSocket closed");
        Ok(())
    }
}

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`FeedError`](crate::FeedError) if the connection or TLS
/// handshake fails.
pub async fn connect(url: &str) -> Result<WsTransport> {
    let (ws_stream, _) = connect_async(url).await?;
    info!(url, "WebSocket handshake completed");

    let (writer, reader) = ws_stream.split();
    Ok(WsTransport::new(writer, reader))
}
