//! The local user's seat selection.

use crate::types::SeatId;

/// Ordered set of seats the local user has chosen.
///
/// Insertion order is preserved for display (checkout summaries list seats in
/// the order they were picked).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    seats: Vec<SeatId>,
}

impl Selection {
    /// Creates an empty selection
    #[must_use]
    pub const fn new() -> Self {
        Self { seats: Vec::new() }
    }

    /// Whether the seat is selected
    #[must_use]
    pub fn contains(&self, seat_id: &SeatId) -> bool {
        self.seats.contains(seat_id)
    }

    /// Add a seat; returns `false` if it was already selected
    pub fn insert(&mut self, seat_id: SeatId) -> bool {
        if self.contains(&seat_id) {
            return false;
        }
        self.seats.push(seat_id);
        true
    }

    /// Remove a seat; returns `false` if it was not selected
    pub fn remove(&mut self, seat_id: &SeatId) -> bool {
        let before = self.seats.len();
        self.seats.retain(|s| s != seat_id);
        self.seats.len() != before
    }

    /// Keep only the seats matching the predicate
    pub fn retain(&mut self, keep: impl FnMut(&SeatId) -> bool) {
        self.seats.retain(keep);
    }

    /// Remove every seat, returning them in selection order
    pub fn clear(&mut self) -> Vec<SeatId> {
        std::mem::take(&mut self.seats)
    }

    /// Selected seats in selection order
    pub fn iter(&self) -> impl Iterator<Item = &SeatId> {
        self.seats.iter()
    }

    /// Number of selected seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a SeatId;
    type IntoIter = std::slice::Iter<'a, SeatId>;

    fn into_iter(self) -> Self::IntoIter {
        self.seats.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order_and_rejects_duplicates() {
        let mut selection = Selection::new();
        assert!(selection.insert(SeatId::from("B-2")));
        assert!(selection.insert(SeatId::from("A-1")));
        assert!(!selection.insert(SeatId::from("B-2")));

        let order: Vec<_> = selection.iter().map(SeatId::as_str).collect();
        assert_eq!(order, ["B-2", "A-1"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut selection = Selection::new();
        selection.insert(SeatId::from("A-1"));
        selection.insert(SeatId::from("A-2"));

        assert!(selection.remove(&SeatId::from("A-1")));
        assert!(!selection.remove(&SeatId::from("A-1")));
        assert_eq!(selection.clear(), vec![SeatId::from("A-2")]);
        assert!(selection.is_empty());
    }
}
