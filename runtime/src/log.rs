//! Bounded, inspectable event log for the real-time channel.
//!
//! Every state transition, reconnect schedule, sent frame and discarded
//! payload is appended with a timestamp. The log keeps the most recent
//! [`CHANNEL_LOG_CAPACITY`] entries.

use chrono::{DateTime, Utc};
use seatmap_core::types::ConnectionState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Entries retained before the oldest are evicted
pub const CHANNEL_LOG_CAPACITY: usize = 256;

/// What happened on the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelLogKind {
    /// Connection state changed
    StateChanged {
        /// Previous state
        from: ConnectionState,
        /// New state
        to: ConnectionState,
    },
    /// A reconnect attempt was scheduled
    ReconnectScheduled {
        /// Consecutive failures so far
        attempt: u32,
        /// Wait before the attempt
        delay: Duration,
    },
    /// A frame was written to the transport
    Sent {
        /// The frame
        frame: String,
    },
    /// A structured message was received and dispatched
    Received {
        /// Message kind tag
        kind: &'static str,
    },
    /// An inbound payload (or a stale outbound frame) was dropped
    Discarded {
        /// Why it was dropped
        reason: String,
        /// The raw payload
        payload: String,
    },
    /// `send` was called outside `Connected`
    SendRejected {
        /// State at the time of the call
        state: ConnectionState,
    },
    /// Automatic reconnection gave up
    Unreachable {
        /// Consecutive failures
        attempts: u32,
    },
}

/// One timestamped log entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelLogEntry {
    /// When it was recorded
    pub at: DateTime<Utc>,
    /// What happened
    pub kind: ChannelLogKind,
}

/// Shared handle to the channel log.
///
/// Cloning yields another handle to the same log.
#[derive(Clone, Debug, Default)]
pub struct ChannelLog {
    entries: Arc<Mutex<VecDeque<ChannelLogEntry>>>,
}

impl ChannelLog {
    /// Empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest when full
    pub fn record(&self, kind: ChannelLogKind) {
        let mut entries = self.lock();
        if entries.len() == CHANNEL_LOG_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(ChannelLogEntry {
            at: Utc::now(),
            kind,
        });
    }

    /// Copy of the retained entries, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<ChannelLogEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Retained entry kinds, oldest first
    #[must_use]
    pub fn kinds(&self) -> Vec<ChannelLogKind> {
        self.lock().iter().map(|entry| entry.kind.clone()).collect()
    }

    /// Number of retained entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is retained
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ChannelLogEntry>> {
        // The log holds plain data; a panic elsewhere cannot leave it inconsistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
