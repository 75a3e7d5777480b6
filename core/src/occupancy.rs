//! Live occupancy state for every seat in a venue.
//!
//! The [`OccupancyStore`] holds exactly one status per seat. Writers go
//! through three transitions:
//!
//! - [`apply_remote`](OccupancyStore::apply_remote): authoritative server state,
//!   last-write-wins by arrival order
//! - [`apply_optimistic`](OccupancyStore::apply_optimistic): a tentative local
//!   write, tagged with the status to restore if the server declines
//! - [`revert_optimistic`](OccupancyStore::revert_optimistic): restore the last
//!   remote status after a rejection
//!
//! # Processing ticks
//!
//! The owner advances a tick counter once per processed event. Within a tick,
//! a seat that received a remote write refuses optimistic writes, so the
//! remote value wins regardless of call order.

use crate::types::{HolderRef, SeatId, SeatStatus, StatusBreakdown};
use std::collections::HashMap;

/// How an entry's current status came to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Reported by the server
    Remote,
    /// Written locally and awaiting confirmation
    Optimistic {
        /// Status to restore on rejection
        revert_to: SeatStatus,
        /// Holder to restore on rejection
        revert_holder: Option<HolderRef>,
    },
}

/// Occupancy of one seat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OccupancyEntry {
    /// The seat
    pub seat_id: SeatId,
    /// Current status
    pub status: SeatStatus,
    /// Who holds the seat, when known
    pub holder_ref: Option<HolderRef>,
    /// Whether the status is confirmed or provisional
    pub origin: EntryOrigin,
    remote_tick: Option<u64>,
}

impl OccupancyEntry {
    const fn free(seat_id: SeatId) -> Self {
        Self {
            seat_id,
            status: SeatStatus::Free,
            holder_ref: None,
            origin: EntryOrigin::Remote,
            remote_tick: None,
        }
    }

    /// Whether the entry carries an unconfirmed local write
    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        matches!(self.origin, EntryOrigin::Optimistic { .. })
    }
}

/// Map from seat to current status.
#[derive(Clone, Debug, Default)]
pub struct OccupancyStore {
    entries: HashMap<SeatId, OccupancyEntry>,
    tick: u64,
}

impl OccupancyStore {
    /// Creates an empty store; every seat reads as `free`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status of a seat, `free` for seats never reported
    #[must_use]
    pub fn status_of(&self, seat_id: &SeatId) -> SeatStatus {
        self.entries
            .get(seat_id)
            .map_or(SeatStatus::Free, |entry| entry.status)
    }

    /// The entry for a seat, if it has ever been written
    #[must_use]
    pub fn entry(&self, seat_id: &SeatId) -> Option<&OccupancyEntry> {
        self.entries.get(seat_id)
    }

    /// Holder of a seat, if known
    #[must_use]
    pub fn holder_of(&self, seat_id: &SeatId) -> Option<&HolderRef> {
        self.entries
            .get(seat_id)
            .and_then(|entry| entry.holder_ref.as_ref())
    }

    /// Whether a seat carries an unconfirmed local write
    #[must_use]
    pub fn is_provisional(&self, seat_id: &SeatId) -> bool {
        self.entries
            .get(seat_id)
            .is_some_and(OccupancyEntry::is_provisional)
    }

    /// Current processing tick
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Start a new processing tick
    pub const fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Overwrite a seat's status with the server's value.
    ///
    /// Always supersedes a pending optimistic write for the same seat.
    pub fn apply_remote(
        &mut self,
        seat_id: SeatId,
        status: SeatStatus,
        holder_ref: Option<HolderRef>,
    ) {
        let tick = self.tick;
        let entry = self
            .entries
            .entry(seat_id.clone())
            .or_insert_with(|| OccupancyEntry::free(seat_id));

        if entry.is_provisional() {
            tracing::trace!(
                seat_id = %entry.seat_id,
                provisional = %entry.status,
                remote = %status,
                "Remote status supersedes optimistic write"
            );
        }

        entry.status = status;
        entry.holder_ref = if status == SeatStatus::Free {
            None
        } else {
            holder_ref
        };
        entry.origin = EntryOrigin::Remote;
        entry.remote_tick = Some(tick);
    }

    /// Tentatively overwrite a seat's status.
    ///
    /// Returns `false` (and changes nothing) when the seat already received a
    /// remote write during the current tick.
    pub fn apply_optimistic(
        &mut self,
        seat_id: SeatId,
        status: SeatStatus,
        holder_ref: Option<HolderRef>,
    ) -> bool {
        let tick = self.tick;
        let entry = self
            .entries
            .entry(seat_id.clone())
            .or_insert_with(|| OccupancyEntry::free(seat_id));

        if entry.remote_tick == Some(tick) {
            tracing::debug!(
                seat_id = %entry.seat_id,
                "Ignoring optimistic write; remote status arrived this tick"
            );
            return false;
        }

        // A second optimistic write keeps the original revert target.
        if !entry.is_provisional() {
            entry.origin = EntryOrigin::Optimistic {
                revert_to: entry.status,
                revert_holder: entry.holder_ref.clone(),
            };
        }
        entry.status = status;
        entry.holder_ref = if status == SeatStatus::Free {
            None
        } else {
            holder_ref
        };
        true
    }

    /// Restore the last remote status of a seat.
    ///
    /// Returns the restored status, or `None` when there was nothing to revert.
    pub fn revert_optimistic(&mut self, seat_id: &SeatId) -> Option<SeatStatus> {
        let entry = self.entries.get_mut(seat_id)?;
        let EntryOrigin::Optimistic {
            revert_to,
            revert_holder,
        } = std::mem::replace(&mut entry.origin, EntryOrigin::Remote)
        else {
            return None;
        };
        entry.status = revert_to;
        entry.holder_ref = revert_holder;
        Some(revert_to)
    }

    /// Count statuses over the given seats (unknown seats count as free)
    pub fn breakdown<'a>(&self, seats: impl IntoIterator<Item = &'a SeatId>) -> StatusBreakdown {
        let mut breakdown = StatusBreakdown::default();
        for seat_id in seats {
            breakdown.record(self.status_of(seat_id));
        }
        breakdown
    }

    /// All written entries, unordered
    pub fn entries(&self) -> impl Iterator<Item = &OccupancyEntry> {
        self.entries.values()
    }

    /// Number of seats with a written entry
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no seat has been written yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
