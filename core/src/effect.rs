//! Side-effect descriptions returned by reducers.
//!
//! Effects are NOT executed by the reducer. The runtime's viewer loop
//! executes them after the state update: it redraws, hands requests to the
//! real-time channel, and surfaces notices.

use crate::message::SeatStatusMessage;
use crate::types::SeatId;
use chrono::{DateTime, Utc};
use std::fmt;

/// Effect type - describes a side effect to be executed
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Redraw the frame. Several `Render`s in one tick draw once.
    Render,

    /// Send a hold/release request through the real-time channel
    Send(SeatStatusMessage),

    /// Show a message to the user
    Notify(Notice),
}

/// What a notice is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The clicked seat is held or sold, or the server refused the hold
    SelectionRejected,
    /// The selection is already at its maximum size
    SelectionLimit,
    /// A seat in the selection was taken by someone else
    HoldLost,
    /// A request could not be sent because the channel is not connected
    NotConnected,
    /// Automatic reconnection gave up
    ChannelUnreachable,
    /// The channel is connected again
    Reconnected,
}

impl NoticeKind {
    /// Whether the notice stays until the condition clears
    #[must_use]
    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::ChannelUnreachable)
    }
}

/// A user-facing message.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    /// Category
    pub kind: NoticeKind,
    /// Seat the notice is about, if any
    pub seat_id: Option<SeatId>,
    /// Text to show
    pub message: String,
    /// When the notice was raised
    pub at: DateTime<Utc>,
}

impl Notice {
    /// Creates a notice
    #[must_use]
    pub fn new(kind: NoticeKind, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            seat_id: None,
            message: message.into(),
            at,
        }
    }

    /// Attach the seat the notice refers to
    #[must_use]
    pub fn for_seat(mut self, seat_id: SeatId) -> Self {
        self.seat_id = Some(seat_id);
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
