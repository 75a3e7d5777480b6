//! The seat-map reducer.
//!
//! Every viewer input (pointer, wheel, zoom buttons, stream messages,
//! channel state changes) is a [`SeatMapAction`] reduced over
//! [`SeatMapState`]. Selecting a seat applies an optimistic hold to the
//! occupancy store and emits [`Effect::Send`] in the same step, so the local
//! view and the outgoing request never diverge.
//!
//! # Reconciliation
//!
//! ```text
//! remote seatStatusChanged  → applyRemote, prune selection if the seat is
//!                             no longer held by this viewer
//! holdRejected              → revertOptimistic, drop from selection
//! SendFailed (not connected) → revertOptimistic, undo the selection change
//! ```

use crate::effect::{Effect, Notice, NoticeKind};
use crate::environment::Clock;
use crate::geometry::GeometryModel;
use crate::message::{PriceBook, SeatStatusMessage, StreamMessage};
use crate::occupancy::OccupancyStore;
use crate::reducer::{Effects, Reducer};
use crate::selection::Selection;
use crate::types::{ConnectionState, HolderRef, Point, SeatId, SeatStatus};
use crate::viewport::{InputOutcome, ViewportController};
use smallvec::smallvec;
use std::fmt;
use std::sync::Arc;

/// Default cap on the number of seats in one selection
pub const DEFAULT_MAX_SELECTION: usize = 10;

// ============================================================================
// State
// ============================================================================

/// Everything the viewer shows for one venue.
#[derive(Clone, Debug)]
pub struct SeatMapState {
    /// Venue geometry (read-only)
    pub geometry: Arc<GeometryModel>,
    /// Seat statuses
    pub occupancy: OccupancyStore,
    /// Seats this viewer holds or is requesting
    pub selection: Selection,
    /// Viewport and pan gesture
    pub controller: ViewportController,
    /// Current prices by category
    pub price_book: PriceBook,
    /// Channel state as last reported
    pub connection: ConnectionState,
    /// Persistent connection notice, cleared on reconnect
    pub connection_notice: Option<Notice>,
}

impl SeatMapState {
    /// Fresh state for a venue: everything free, nothing selected, default view
    #[must_use]
    pub fn new(geometry: Arc<GeometryModel>) -> Self {
        Self {
            geometry,
            occupancy: OccupancyStore::new(),
            selection: Selection::new(),
            controller: ViewportController::default(),
            price_book: PriceBook::default(),
            connection: ConnectionState::Disconnected,
            connection_notice: None,
        }
    }

    /// Whether a click on the seat toggles it
    #[must_use]
    pub fn is_selectable(&self, seat_id: &SeatId) -> bool {
        is_selectable(&self.occupancy, &self.selection, seat_id)
    }

    /// Sum of the prices of selected seats.
    ///
    /// Seats without a category, or whose category is not priced, contribute
    /// nothing.
    #[must_use]
    pub fn selection_total(&self) -> f64 {
        self.selection
            .iter()
            .filter_map(|seat_id| self.geometry.seat(seat_id))
            .filter_map(|seat| seat.category())
            .filter_map(|category| self.price_book.price_of(&category))
            .sum()
    }
}

fn is_selectable(occupancy: &OccupancyStore, selection: &Selection, seat_id: &SeatId) -> bool {
    selection.contains(seat_id) || occupancy.status_of(seat_id) == SeatStatus::Free
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the seat-map reducer.
#[derive(Clone, Debug, PartialEq)]
pub enum SeatMapAction {
    /// Pointer pressed at a device position
    PointerDown {
        /// Device position
        point: Point,
    },
    /// Pointer moved
    PointerMove {
        /// Device position
        point: Point,
    },
    /// Pointer released
    PointerUp,
    /// Wheel scrolled; positive is down
    Wheel {
        /// Scroll delta
        delta_y: f64,
    },
    /// Zoom-in button
    ZoomIn,
    /// Zoom-out button
    ZoomOut,
    /// Reset-view button
    ResetView,
    /// Toggle a seat without a pointer (keyboard, list view)
    ToggleSeat {
        /// The seat
        seat_id: SeatId,
    },
    /// Release every selected seat
    ClearSelection,

    /// Authoritative status from the stream
    SeatStatusChanged {
        /// The seat
        seat_id: SeatId,
        /// New status
        status: SeatStatus,
        /// Holder, when attributed
        holder_ref: Option<HolderRef>,
    },
    /// New price book from the stream
    PriceBookUpdated {
        /// Prices by category
        price_book: PriceBook,
    },
    /// The server refused a hold
    HoldRejected {
        /// The seat
        seat_id: SeatId,
        /// Server-supplied explanation
        reason: Option<String>,
    },

    /// A request could not be sent
    SendFailed {
        /// The request that was not sent
        message: SeatStatusMessage,
    },
    /// Channel state changed
    ConnectionChanged {
        /// New state
        state: ConnectionState,
    },
    /// Automatic reconnection gave up
    ChannelUnreachable {
        /// Attempts made before giving up
        attempts: u32,
    },
}

impl From<StreamMessage> for SeatMapAction {
    fn from(message: StreamMessage) -> Self {
        match message {
            StreamMessage::SeatStatusChanged {
                seat_id,
                status,
                holder_ref,
            } => Self::SeatStatusChanged {
                seat_id,
                status,
                holder_ref,
            },
            StreamMessage::PriceBookUpdated { price_book } => Self::PriceBookUpdated { price_book },
            StreamMessage::HoldRejected { seat_id, reason } => {
                Self::HoldRejected { seat_id, reason }
            },
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the seat-map reducer.
#[derive(Clone)]
pub struct SeatMapEnvironment {
    /// Clock for notice timestamps
    pub clock: Arc<dyn Clock>,
    /// This viewer's holder reference, sent with every request
    pub holder_ref: HolderRef,
    /// Maximum seats in one selection
    pub max_selection: usize,
}

impl SeatMapEnvironment {
    /// Creates an environment with the default selection cap
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, holder_ref: HolderRef) -> Self {
        Self {
            clock,
            holder_ref,
            max_selection: DEFAULT_MAX_SELECTION,
        }
    }

    /// Override the selection cap
    #[must_use]
    pub const fn with_max_selection(mut self, max_selection: usize) -> Self {
        self.max_selection = max_selection;
        self
    }

    fn notice(&self, kind: NoticeKind, message: impl Into<String>) -> Notice {
        Notice::new(kind, message, self.clock.now())
    }
}

impl fmt::Debug for SeatMapEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeatMapEnvironment")
            .field("holder_ref", &self.holder_ref)
            .field("max_selection", &self.max_selection)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the interactive seat map.
#[derive(Clone, Copy, Debug, Default)]
pub struct SeatMapReducer;

impl Reducer for SeatMapReducer {
    type State = SeatMapState;
    type Action = SeatMapAction;
    type Environment = SeatMapEnvironment;

    fn reduce(
        &self,
        state: &mut SeatMapState,
        action: SeatMapAction,
        env: &SeatMapEnvironment,
    ) -> Effects {
        match action {
            SeatMapAction::PointerDown { point } => {
                let outcome = state.controller.pointer_down(point, &state.geometry, |id| {
                    is_selectable(&state.occupancy, &state.selection, id)
                });
                match outcome {
                    InputOutcome::ToggleSeat(seat_id) => toggle(state, seat_id, env),
                    other => redraw_if_needed(&other),
                }
            },
            SeatMapAction::PointerMove { point } => {
                redraw_if_needed(&state.controller.pointer_move(point))
            },
            SeatMapAction::PointerUp => redraw_if_needed(&state.controller.pointer_up()),
            SeatMapAction::Wheel { delta_y } => redraw_if_needed(&state.controller.wheel(delta_y)),
            SeatMapAction::ZoomIn => redraw_if_needed(&state.controller.zoom_in()),
            SeatMapAction::ZoomOut => redraw_if_needed(&state.controller.zoom_out()),
            SeatMapAction::ResetView => redraw_if_needed(&state.controller.reset()),

            SeatMapAction::ToggleSeat { seat_id } => {
                if state.geometry.seat(&seat_id).is_none() {
                    tracing::warn!(seat_id = %seat_id, "Toggle requested for unknown seat");
                    return smallvec![];
                }
                toggle(state, seat_id, env)
            },

            SeatMapAction::ClearSelection => clear_selection(state, env),

            SeatMapAction::SeatStatusChanged {
                seat_id,
                status,
                holder_ref,
            } => apply_remote_status(state, seat_id, status, holder_ref, env),

            SeatMapAction::PriceBookUpdated { price_book } => {
                tracing::debug!(categories = price_book.len(), "Price book replaced");
                state.price_book = price_book;
                smallvec![]
            },

            SeatMapAction::HoldRejected { seat_id, reason } => {
                state.occupancy.revert_optimistic(&seat_id);
                state.selection.remove(&seat_id);
                metrics::counter!("seatmap_selection_rejected_total").increment(1);
                tracing::info!(
                    seat_id = %seat_id,
                    reason = reason.as_deref().unwrap_or(""),
                    "Hold rejected by server"
                );
                let message = match reason {
                    Some(reason) => format!("Seat {seat_id} could not be held: {reason}"),
                    None => format!("Seat {seat_id} could not be held"),
                };
                smallvec![
                    Effect::Notify(env.notice(NoticeKind::SelectionRejected, message).for_seat(seat_id)),
                    Effect::Render,
                ]
            },

            SeatMapAction::SendFailed { message } => {
                let restored = state.occupancy.revert_optimistic(&message.seat_id);
                match message.status {
                    SeatStatus::Held => {
                        state.selection.remove(&message.seat_id);
                    },
                    SeatStatus::Free if restored == Some(SeatStatus::Held) => {
                        state.selection.insert(message.seat_id.clone());
                    },
                    SeatStatus::Free | SeatStatus::Sold => {},
                }
                tracing::warn!(
                    seat_id = %message.seat_id,
                    status = %message.status,
                    "Request not sent; local change reverted"
                );
                smallvec![
                    Effect::Notify(
                        env.notice(
                            NoticeKind::NotConnected,
                            "Not connected to live seat updates; your change was not sent",
                        )
                        .for_seat(message.seat_id),
                    ),
                    Effect::Render,
                ]
            },

            SeatMapAction::ConnectionChanged { state: connection } => {
                state.connection = connection;
                if connection == ConnectionState::Connected && state.connection_notice.take().is_some() {
                    return smallvec![Effect::Notify(
                        env.notice(NoticeKind::Reconnected, "Live seat updates restored")
                    )];
                }
                smallvec![]
            },

            SeatMapAction::ChannelUnreachable { attempts } => {
                state.connection = ConnectionState::Disconnected;
                let notice = env.notice(
                    NoticeKind::ChannelUnreachable,
                    format!("Live seat updates are unavailable after {attempts} attempts"),
                );
                state.connection_notice = Some(notice.clone());
                smallvec![Effect::Notify(notice)]
            },
        }
    }
}

fn redraw_if_needed(outcome: &InputOutcome) -> Effects {
    match outcome {
        InputOutcome::Redraw => smallvec![Effect::Render],
        InputOutcome::Unchanged | InputOutcome::ToggleSeat(_) => smallvec![],
    }
}

fn toggle(state: &mut SeatMapState, seat_id: SeatId, env: &SeatMapEnvironment) -> Effects {
    if state.selection.contains(&seat_id) {
        if !state
            .occupancy
            .apply_optimistic(seat_id.clone(), SeatStatus::Free, None)
        {
            return smallvec![];
        }
        state.selection.remove(&seat_id);
        tracing::debug!(seat_id = %seat_id, "Seat deselected");
        return smallvec![
            Effect::Send(SeatStatusMessage::release(seat_id, env.holder_ref.clone())),
            Effect::Render,
        ];
    }

    let status = state.occupancy.status_of(&seat_id);
    if status != SeatStatus::Free {
        metrics::counter!("seatmap_selection_rejected_total").increment(1);
        tracing::info!(seat_id = %seat_id, %status, "Selection rejected; seat unavailable");
        return smallvec![Effect::Notify(
            env.notice(
                NoticeKind::SelectionRejected,
                format!("Seat {seat_id} is {status} and cannot be selected"),
            )
            .for_seat(seat_id)
        )];
    }

    if state.selection.len() >= env.max_selection {
        tracing::info!(seat_id = %seat_id, max = env.max_selection, "Selection limit reached");
        return smallvec![Effect::Notify(
            env.notice(
                NoticeKind::SelectionLimit,
                format!("You can select at most {} seats", env.max_selection),
            )
            .for_seat(seat_id)
        )];
    }

    if !state.occupancy.apply_optimistic(
        seat_id.clone(),
        SeatStatus::Held,
        Some(env.holder_ref.clone()),
    ) {
        return smallvec![];
    }
    state.selection.insert(seat_id.clone());
    tracing::debug!(seat_id = %seat_id, "Seat selected");
    smallvec![
        Effect::Send(SeatStatusMessage::hold(seat_id, env.holder_ref.clone())),
        Effect::Render,
    ]
}

fn clear_selection(state: &mut SeatMapState, env: &SeatMapEnvironment) -> Effects {
    let mut effects = Effects::new();
    for seat_id in state.selection.clear() {
        if state
            .occupancy
            .apply_optimistic(seat_id.clone(), SeatStatus::Free, None)
        {
            effects.push(Effect::Send(SeatStatusMessage::release(
                seat_id,
                env.holder_ref.clone(),
            )));
        } else {
            // Remote already decided this seat in the current tick.
            tracing::debug!(seat_id = %seat_id, "Skipping release; remote status arrived this tick");
        }
    }
    if !effects.is_empty() {
        effects.push(Effect::Render);
    }
    effects
}

fn apply_remote_status(
    state: &mut SeatMapState,
    seat_id: SeatId,
    status: SeatStatus,
    holder_ref: Option<HolderRef>,
    env: &SeatMapEnvironment,
) -> Effects {
    let held_by_us = status == SeatStatus::Held
        && holder_ref.as_ref().is_none_or(|holder| holder == &env.holder_ref);

    state
        .occupancy
        .apply_remote(seat_id.clone(), status, holder_ref);

    let mut effects = Effects::new();
    if state.selection.contains(&seat_id) && !held_by_us {
        state.selection.remove(&seat_id);
        tracing::info!(seat_id = %seat_id, %status, "Selected seat changed remotely; removed from selection");
        let message = if status == SeatStatus::Free {
            format!("Your hold on seat {seat_id} has ended")
        } else {
            format!("Seat {seat_id} is no longer available")
        };
        effects.push(Effect::Notify(
            env.notice(NoticeKind::HoldLost, message).for_seat(seat_id),
        ));
    }
    effects.push(Effect::Render);
    effects
}
