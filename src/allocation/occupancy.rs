//! Seats of the event that are already taken outside the current session.

use crate::allocation::normalize::{normalize, KeyIndex, NormKey};
use crate::models::{CategoryId, OccupiedSeat, SeatRef};

/// Booked/assigned seats loaded from the backend for one event.
///
/// An entry carrying a category id is an existing assignment of that
/// category; it only counts as booked for the other categories.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    entries: Vec<(OccupiedSeat, NormKey)>,
    index: KeyIndex,
}

impl Occupancy {
    pub fn new(seats: impl IntoIterator<Item = OccupiedSeat>) -> Self {
        let entries: Vec<(OccupiedSeat, NormKey)> = seats
            .into_iter()
            .map(|seat| {
                let key = normalize(&seat.seat);
                (seat, key)
            })
            .collect();
        let index = KeyIndex::build(entries.iter().map(|(_, key)| key));
        Self { entries, index }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn seats(&self) -> impl Iterator<Item = &OccupiedSeat> {
        self.entries.iter().map(|(seat, _)| seat)
    }

    /// Booked from the point of view of `editing`: every match counts except
    /// the ones owned by `editing` itself.
    pub fn is_booked(&self, key: &NormKey, editing: Option<&CategoryId>) -> bool {
        self.index.candidates(key).iter().any(|&pos| {
            let (seat, k) = &self.entries[pos];
            k.matches(key)
                && match (&seat.category_id, editing) {
                    (Some(owner), Some(editing)) => owner != editing,
                    _ => true,
                }
        })
    }

    /// Existing assignments of `category`, used to seed its draft.
    pub fn owned_by<'a>(&'a self, category: &'a CategoryId) -> impl Iterator<Item = &'a SeatRef> + 'a {
        self.entries
            .iter()
            .filter(move |(seat, _)| seat.category_id.as_ref() == Some(category))
            .map(|(seat, _)| &seat.seat)
    }
}
