//! # Seatmap Core
//!
//! Synchronous domain of the venue seat-map viewer.
//!
//! ## Core Concepts
//!
//! - **Geometry**: immutable venue layout (seats, sections, stage, outlines)
//! - **Occupancy**: per-seat status, written by the server and optimistically
//!   by the viewer
//! - **Selection**: seats this viewer holds or is requesting
//! - **Render**: draws one frame onto any [`Surface`]
//! - **Viewport**: pan/zoom and pointer gesture interpretation
//! - **Verifier**: reconciles layout against persisted seat records
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)` over all of the above
//!
//! Everything here is deterministic and non-blocking. Network I/O and the
//! event loop live in `seatmap-runtime`.
//!
//! ## Example
//!
//! ```ignore
//! use seatmap_core::*;
//!
//! let geometry = Arc::new(GeometryModel::from_json(&venue_json)?);
//! let mut state = SeatMapState::new(geometry);
//! let env = SeatMapEnvironment::new(Arc::new(SystemClock), HolderRef::from("viewer-1"));
//!
//! let effects = SeatMapReducer.reduce(
//!     &mut state,
//!     SeatMapAction::PointerDown { point: Point::new(120.0, 80.0) },
//!     &env,
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod effect;
pub mod environment;
pub mod geometry;
pub mod message;
pub mod occupancy;
pub mod reducer;
pub mod render;
pub mod selection;
pub mod session;
pub mod transport;
pub mod types;
pub mod verifier;
pub mod viewport;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

pub use effect::{Effect, Notice, NoticeKind};
pub use environment::{Clock, SystemClock};
pub use geometry::{Category, Element, ElementType, GeometryError, GeometryModel, Seat};
pub use message::{MessageParseError, PriceBook, SeatStatusMessage, StreamMessage};
pub use occupancy::{OccupancyEntry, OccupancyStore};
pub use reducer::{Effects, Reducer};
pub use render::{FrameStats, RenderEngine, RenderOptions, Surface, SvgSurface, Theme};
pub use selection::Selection;
pub use session::{SeatMapAction, SeatMapEnvironment, SeatMapReducer, SeatMapState};
pub use transport::{BoxFuture, Connection, Transport, TransportError};
pub use types::{
    CategoryId, Color, ConnectionState, EventId, HolderRef, Point, Rect, SeatId, SeatStatus,
    StatusBreakdown, VenueId,
};
pub use verifier::{PersistedSeatCounts, Severity, VenueVerifier, VerificationReport};
pub use viewport::{InputOutcome, Viewport, ViewportController};
