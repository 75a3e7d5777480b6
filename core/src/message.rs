//! Event-stream wire messages.
//!
//! Frames are JSON objects tagged by `kind`:
//!
//! ```json
//! {"kind":"seatStatusChanged","seatId":"A-1","status":"held","holderRef":"viewer-123"}
//! {"kind":"priceBookUpdated","priceBook":{"vip":120.0,"std":45.5}}
//! {"kind":"holdRejected","seatId":"A-1","reason":"already held"}
//! ```
//!
//! Outgoing hold/release requests reuse the `seatStatusChanged` shape with
//! the requested status.

use crate::types::{CategoryId, HolderRef, SeatId, SeatStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// An inbound frame could not be decoded.
#[derive(Error, Debug)]
#[error("Failed to parse stream message: {0}")]
pub struct MessageParseError(#[from] pub serde_json::Error);

/// Prices per seat category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceBook(BTreeMap<CategoryId, f64>);

impl PriceBook {
    /// Creates a price book
    #[must_use]
    pub const fn new(prices: BTreeMap<CategoryId, f64>) -> Self {
        Self(prices)
    }

    /// Price of one seat in a category
    #[must_use]
    pub fn price_of(&self, category_id: &CategoryId) -> Option<f64> {
        self.0.get(category_id).copied()
    }

    /// Number of priced categories
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no category is priced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(CategoryId, f64)> for PriceBook {
    fn from_iter<I: IntoIterator<Item = (CategoryId, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A frame received from the event stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StreamMessage {
    /// Authoritative status of one seat
    SeatStatusChanged {
        /// The seat
        seat_id: SeatId,
        /// New status
        status: SeatStatus,
        /// Who holds the seat, when the server attributes it
        #[serde(default, skip_serializing_if = "Option::is_none")]
        holder_ref: Option<HolderRef>,
    },

    /// Replacement price book
    PriceBookUpdated {
        /// Prices by category
        price_book: PriceBook,
    },

    /// The server refused a hold this viewer requested
    HoldRejected {
        /// The seat
        seat_id: SeatId,
        /// Server-supplied explanation
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl StreamMessage {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`MessageParseError`] if the frame is not JSON, has an unknown
    /// `kind`, or carries a status outside `free|held|sold`.
    pub fn parse(frame: &str) -> Result<Self, MessageParseError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Kind tag as it appears on the wire
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SeatStatusChanged { .. } => "seatStatusChanged",
            Self::PriceBookUpdated { .. } => "priceBookUpdated",
            Self::HoldRejected { .. } => "holdRejected",
        }
    }
}

/// An outgoing hold/release request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeatStatusMessage {
    /// The seat
    pub seat_id: SeatId,
    /// Requested status
    pub status: SeatStatus,
    /// The requesting viewer
    pub holder_ref: Option<HolderRef>,
}

impl SeatStatusMessage {
    /// Request a hold on behalf of `holder_ref`
    #[must_use]
    pub const fn hold(seat_id: SeatId, holder_ref: HolderRef) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Held,
            holder_ref: Some(holder_ref),
        }
    }

    /// Request a release on behalf of `holder_ref`
    #[must_use]
    pub const fn release(seat_id: SeatId, holder_ref: HolderRef) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Free,
            holder_ref: Some(holder_ref),
        }
    }

    /// Encode as a text frame.
    ///
    /// # Errors
    ///
    /// Propagates serialization failures from `serde_json`.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&StreamMessage::from(self.clone()))
    }
}

impl From<SeatStatusMessage> for StreamMessage {
    fn from(message: SeatStatusMessage) -> Self {
        Self::SeatStatusChanged {
            seat_id: message.seat_id,
            status: message.status,
            holder_ref: message.holder_ref,
        }
    }
}
