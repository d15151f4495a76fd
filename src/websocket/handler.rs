//! Incoming frame processing.

use std::collections::HashMap;
use std::future::Future;

use tracing::{debug, info, trace};

use super::Transport;
use super::observer::{FeedObserver, TracingObserver};
use crate::book::BookRegistry;
use crate::bus::{Update, UpdateSender};
use crate::frame::{Envelope, Event, Frame, decode_frame};
use crate::models::{Channel, ChannelMessage, SubscriptionStatus, SystemEvent};
use crate::payload::{ChannelPayload, type_channel_message, type_envelope};
use crate::{FeedError, Result};

/// Drives frames from a [`Transport`] through decoding, typing and the
/// book replicas onto the update bus.
///
/// Each frame is handled to completion, including the bus send, before the
/// next one is read. Replicas are owned here and never shared.
pub struct FeedProcessor<O = TracingObserver> {
    books: BookRegistry,
    bus: UpdateSender,
    observer: O,
    sequences: HashMap<(String, Option<String>), i64>,
}

impl FeedProcessor<TracingObserver> {
    pub fn new(books: BookRegistry, bus: UpdateSender) -> Self {
        Self::with_observer(books, bus, TracingObserver)
    }
}

impl<O: FeedObserver> FeedProcessor<O> {
    pub fn with_observer(books: BookRegistry, bus: UpdateSender, observer: O) -> Self {
        Self {
            books,
            bus,
            observer,
            sequences: HashMap::new(),
        }
    }

    pub fn books(&self) -> &BookRegistry {
        &self.books
    }

    /// Mutable access for a subscription controller, e.g. to drop a
    /// desynced replica before resubscribing.
    pub fn books_mut(&mut self) -> &mut BookRegistry {
        &mut self.books
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Reads frames until the transport ends, a fatal error occurs, or
    /// `shutdown` resolves. The transport is closed on the way out.
    ///
    /// `shutdown` is only observed between frames, so a frame that has been
    /// received is always fully processed.
    ///
    /// # Errors
    ///
    /// Returns transport errors and [`FeedError::BusClosed`]. Errors local
    /// to one frame go to the observer instead.
    pub async fn run<T, S>(&mut self, transport: &mut T, shutdown: S) -> Result<()>
    where
        T: Transport,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested, stopping frame processing");
                    break Ok(());
                }
                frame = transport.receive() => match frame {
                    Some(Ok(text)) => {
                        if let Err(e) = self.process_frame(&text).await {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => break Err(e),
                    None => {
                        info!("Transport ended");
                        break Ok(());
                    }
                },
            }
        };

        if let Err(e) = transport.close().await {
            debug!(error = %e, "Transport close failed");
        }
        result
    }

    /// Processes one raw text frame.
    ///
    /// # Errors
    ///
    /// Only [`FeedError::BusClosed`] is returned. Undecodable frames are
    /// reported to the observer and skipped.
    pub async fn process_frame(&mut self, text: &str) -> Result<()> {
        let frame = match decode_frame(text) {
            Ok(frame) => frame,
            Err(e) => {
                self.observer.frame_dropped(&e, text);
                return Ok(());
            }
        };

        match frame {
            Frame::Event(Event::System(event)) => {
                self.handle_system_event(&event);
                Ok(())
            }
            Frame::Event(Event::Channel(message)) => self.handle_channel_message(message, text).await,
            Frame::Envelope(envelope) => self.handle_envelope(envelope, text).await,
        }
    }

    fn handle_system_event(&mut self, event: &SystemEvent) {
        self.observer.system_event(event);
        if let SystemEvent::SubscriptionStatus(status) = event {
            self.track_subscription(status);
        }
    }

    fn track_subscription(&mut self, status: &SubscriptionStatus) {
        if !status.is_book() {
            return;
        }
        let Some(pair) = status.pair.as_deref() else {
            return;
        };

        if status.is_subscribed() {
            self.books.subscribed(pair, status.book_depth());
        } else if status.is_unsubscribed() {
            self.books.unsubscribed(pair);
        }
    }

    async fn handle_channel_message(&mut self, message: ChannelMessage, text: &str) -> Result<()> {
        if matches!(
            Channel::from_name(&message.channel),
            Some(Channel::Heartbeat | Channel::Status)
        ) {
            trace!(channel = %message.channel, "Skipping keepalive message");
            return Ok(());
        }

        let payload = match type_channel_message(&message) {
            Ok(payload) => payload,
            Err(e) => {
                self.observer.frame_dropped(&e, text);
                return Ok(());
            }
        };
        let pair = match &payload {
            ChannelPayload::AccountOrders(update) => Some(update.symbol.clone()),
            ChannelPayload::TradeEvents(trades) => trades.first().map(|t| t.symbol.clone()),
            _ => None,
        };

        let update = Update {
            channel_id: None,
            channel_name: message.channel,
            pair,
            sequence: None,
            payload,
            replica: None,
        };
        self.deliver(update, text).await
    }

    async fn handle_envelope(&mut self, envelope: Envelope, text: &str) -> Result<()> {
        if let Some(sequence) = envelope.sequence {
            self.check_sequence(&envelope, sequence);
        }

        let payload = match type_envelope(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                self.observer.frame_dropped(&e, text);
                return Ok(());
            }
        };

        let update = Update {
            channel_id: envelope.channel_id,
            channel_name: envelope.channel_name,
            pair: envelope.pair,
            sequence: envelope.sequence,
            payload,
            replica: None,
        };
        self.deliver(update, text).await
    }

    fn check_sequence(&mut self, envelope: &Envelope, sequence: i64) {
        let key = (envelope.channel_name.clone(), envelope.pair.clone());
        if let Some(previous) = self.sequences.insert(key, sequence)
            && previous.checked_add(1) != Some(sequence)
        {
            self.observer.sequence_gap(
                &envelope.channel_name,
                envelope.pair.as_deref(),
                previous,
                sequence,
            );
        }
    }

    /// Applies book payloads to their replica, then sends the update.
    async fn deliver(&mut self, mut update: Update, text: &str) -> Result<()> {
        if update.payload.is_book() {
            let Some(pair) = update.pair.as_deref() else {
                let e = FeedError::SchemaMismatch(format!(
                    "{}: book payload without a pair",
                    update.channel_name
                ));
                self.observer.frame_dropped(&e, text);
                return Ok(());
            };

            match self.books.apply(pair, &update.payload) {
                Ok(_) => {}
                Err(e @ FeedError::ChecksumMismatch { .. }) => self.observer.desynced(pair, &e),
                Err(e) if e.is_frame_local() => {
                    self.observer.frame_dropped(&e, text);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
            update.replica = self.books.state(pair);
        }

        self.bus.send(update).await
    }
}
