//! Shared value types for the seat-map viewer.
//!
//! Identifiers are opaque strings as they arrive from venue documents and the
//! event stream. Geometry is expressed in `f64` world units; the viewport maps
//! world units onto device pixels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`")]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a seat, unique within its venue
    SeatId
);
string_id!(
    /// Identifier of a seat category (pricing/styling group)
    CategoryId
);
string_id!(
    /// Identifier of a venue layout
    VenueId
);
string_id!(
    /// Identifier of an event held at a venue
    EventId
);
string_id!(
    /// Opaque reference to whoever holds a seat (a viewer session, a box office terminal)
    HolderRef
);

// ============================================================================
// Seat status
// ============================================================================

/// Occupancy status of a seat.
///
/// The same vocabulary is used end-to-end: venue state, outgoing hold/release
/// requests, and server broadcasts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    /// Available for selection
    #[default]
    Free,
    /// Provisionally reserved, pending purchase
    Held,
    /// Purchased
    Sold,
}

impl SeatStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [Self; 3] = [Self::Free, Self::Held, Self::Sold];

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Held => "held",
            Self::Sold => "sold",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of `free|held|sold`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown seat status '{0}'")]
pub struct UnknownSeatStatus(pub String);

impl FromStr for SeatStatus {
    type Err = UnknownSeatStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Self::Free),
            "held" => Ok(Self::Held),
            "sold" => Ok(Self::Sold),
            other => Err(UnknownSeatStatus(other.to_string())),
        }
    }
}

/// Per-status seat counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    /// Seats available
    pub free: u64,
    /// Seats on hold
    pub held: u64,
    /// Seats sold
    pub sold: u64,
}

impl StatusBreakdown {
    /// Count one seat with the given status
    pub const fn record(&mut self, status: SeatStatus) {
        match status {
            SeatStatus::Free => self.free += 1,
            SeatStatus::Held => self.held += 1,
            SeatStatus::Sold => self.sold += 1,
        }
    }

    /// Total seats across all statuses
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.free + self.held + self.sold
    }
}

/// State of the real-time connection as seen by the viewer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No transport is open
    #[default]
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Transport open; sends are effective
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Geometry primitives
// ============================================================================

/// A point in world or device space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Point {
    /// Creates a new point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Creates a new rectangle
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the rectangle (edges inclusive)
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Centre of the rectangle
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// An sRGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Color {
    /// Creates a colour from its channels
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`. Returns `None` for anything else.
    #[must_use]
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self::rgb(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            )),
            3 => {
                let expand = |s: &str| channel(s).map(|v| v * 17);
                Some(Self::rgb(
                    expand(hex.get(0..1)?)?,
                    expand(hex.get(1..2)?)?,
                    expand(hex.get(2..3)?)?,
                ))
            }
            _ => None,
        }
    }

    /// Format as `#rrggbb`
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_status_wire_names() {
        for status in SeatStatus::ALL {
            assert_eq!(status.as_str().parse::<SeatStatus>(), Ok(status));
        }
        assert!("hold".parse::<SeatStatus>().is_err());
        assert!("selected".parse::<SeatStatus>().is_err());
    }

    #[test]
    fn test_seat_status_serde_lowercase() {
        let json = serde_json::to_string(&SeatStatus::Held).unwrap_or_default();
        assert_eq!(json, "\"held\"");
    }

    #[test]
    fn test_color_hex_parsing() {
        assert_eq!(Color::from_hex("#ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("#fff"), Some(Color::rgb(255, 255, 255)));
        assert_eq!(Color::from_hex("red"), None);
        assert_eq!(Color::from_hex("#12345"), None);
        assert_eq!(Color::rgb(16, 185, 129).to_hex(), "#10b981");
    }

    #[test]
    fn test_rect_contains_edges() {
        let rect = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Point::new(10.0, 10.0)));
        assert!(rect.contains(Point::new(30.0, 30.0)));
        assert!(!rect.contains(Point::new(30.1, 15.0)));
    }

    #[test]
    fn test_breakdown_totals() {
        let mut breakdown = StatusBreakdown::default();
        breakdown.record(SeatStatus::Free);
        breakdown.record(SeatStatus::Sold);
        breakdown.record(SeatStatus::Sold);
        assert_eq!(breakdown.total(), 3);
        assert_eq!(breakdown.sold, 2);
    }
}
