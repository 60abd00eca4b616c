//! Delivery of compiled sync messages.
//!
//! The engine hands every non-empty [`SyncMessage`] to a [`SyncSink`]. How
//! it reaches the client (a game connection, a websocket, a queue) is the
//! sink's business. [`BroadcastSink`] fans messages out over a
//! [`tokio::sync::broadcast`] channel.

use std::future::Future;
use std::sync::Arc;

use accolade_types::SyncMessage;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::SinkError;

/// Default capacity of a [`BroadcastSink`] channel.
///
/// A subscriber that falls behind by more than this many messages receives
/// [`broadcast::error::RecvError::Lagged`] and should request a full resync.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Receives compiled sync messages.
pub trait SyncSink: Send + Sync {
    /// Deliver `message` to its subject.
    fn emit(&self, message: SyncMessage) -> impl Future<Output = Result<(), SinkError>> + Send;
}

/// Broadcast fan-out of sync messages to any number of subscribers.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<Arc<SyncMessage>>,
}

impl BroadcastSink {
    /// Create a sink with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to every message emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<SyncMessage>> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl SyncSink for BroadcastSink {
    async fn emit(&self, message: SyncMessage) -> Result<(), SinkError> {
        let subject = message.subject;
        match self.sender.send(Arc::new(message)) {
            Ok(receivers) => {
                debug!(%subject, receivers, "sync message broadcast");
            }
            Err(_) => {
                // No subscribers: nobody is listening for this subject.
                debug!(%subject, "sync message dropped, no subscribers");
            }
        }
        Ok(())
    }
}
