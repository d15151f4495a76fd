//! Observation hooks for the processing loop.

use tracing::{debug, info, trace, warn};

use crate::FeedError;
use crate::models::SystemEvent;

/// Receives events the processing loop does not turn into updates.
///
/// Every hook has a default that logs through `tracing`, so implementors
/// only override what they act on. A subscription controller would
/// typically override [`desynced`](Self::desynced) to resubscribe.
pub trait FeedObserver: Send {
    /// A frame failed to decode or type and was skipped.
    fn frame_dropped(&mut self, error: &FeedError, frame: &str) {
        warn!(%error, frame_len = frame.len(), "Dropping frame");
    }

    /// A replica failed its checksum and needs a fresh snapshot.
    fn desynced(&mut self, symbol: &str, error: &FeedError) {
        warn!(symbol, %error, "Order book desynced, resubscribe required");
    }

    fn system_event(&mut self, event: &SystemEvent) {
        match event {
            SystemEvent::Heartbeat => trace!("Heartbeat"),
            SystemEvent::Pong { reqid } => debug!(?reqid, "Pong"),
            SystemEvent::SystemStatus(status) => {
                info!(status = %status.status, version = ?status.version, "System status");
            }
            SystemEvent::SubscriptionStatus(status) => info!(
                status = %status.status,
                channel = ?status.channel_name,
                pair = ?status.pair,
                error = ?status.error_message,
                "Subscription status"
            ),
            SystemEvent::Error {
                error_message,
                reqid,
            } => warn!(?reqid, "Server error: {error_message}"),
            SystemEvent::Unknown => debug!("Unrecognized system event"),
        }
    }

    /// A sequenced channel skipped or repeated a sequence number.
    fn sequence_gap(&mut self, channel: &str, pair: Option<&str>, previous: i64, current: i64) {
        warn!(channel, ?pair, previous, current, "Sequence gap");
    }
}

/// Logs every event with `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FeedObserver for TracingObserver {}
