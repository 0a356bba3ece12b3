//! Snapshot delivery.
//!
//! The transport is abstracted as a [`SnapshotSink`]. An `mpsc::Sender`
//! is a sink for a single observer; [`SnapshotBus`] fans out to any
//! number of subscribers. Channels keep per-sender order, so observers
//! see one owner's snapshots in commit order.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::message::SnapshotMessage;
use crate::error::ReplicationError;

/// Where a committing owner sends its snapshot.
pub trait SnapshotSink {
    /// Deliver one message.
    ///
    /// # Errors
    ///
    /// `ReplicationError::ChannelClosed` if delivery is impossible.
    fn send(&self, message: SnapshotMessage) -> Result<(), ReplicationError>;
}

impl SnapshotSink for Sender<SnapshotMessage> {
    fn send(&self, message: SnapshotMessage) -> Result<(), ReplicationError> {
        Sender::send(self, message).map_err(|_| ReplicationError::ChannelClosed)
    }
}

/// Broadcast channel: every subscriber receives every message.
///
/// Subscribers whose receiver was dropped are pruned on the next send.
#[derive(Debug, Default)]
pub struct SnapshotBus {
    subscribers: Mutex<Vec<Sender<SnapshotMessage>>>,
}

impl SnapshotBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self) -> Receiver<SnapshotMessage> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Number of live subscribers as of the last send.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl SnapshotSink for SnapshotBus {
    fn send(&self, message: SnapshotMessage) -> Result<(), ReplicationError> {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(message.clone()).is_ok());
        debug!(
            seat = %message.seat,
            version = message.version,
            subscribers = subscribers.len(),
            "snapshot broadcast"
        );
        Ok(())
    }
}
