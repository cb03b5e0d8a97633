use serde::{Deserialize, Serialize};

use crate::allocation::normalize::{normalize, KeyIndex, NormKey};
use crate::models::SeatRef;

/// Identifier of a ticket category. Either the backend id or a client-side
/// temporary id for categories that do not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CategoryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// In-progress seat set of one ticket category.
///
/// Seats keep their insertion order; each one is stored together with its
/// normalized key so membership checks never re-normalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DraftRecord", into = "DraftRecord")]
pub struct TicketCategoryDraft {
    pub id: CategoryId,
    pub name: String,
    pub price: f64,
    seats: Vec<(SeatRef, NormKey)>,
    index: KeyIndex,
}

impl TicketCategoryDraft {
    pub fn new(id: CategoryId, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            seats: Vec::new(),
            index: KeyIndex::default(),
        }
    }

    /// Pre-assigns `seats`, skipping duplicates. Exclusivity against other
    /// drafts is enforced when the draft joins a store.
    pub fn with_seats(mut self, seats: impl IntoIterator<Item = SeatRef>) -> Self {
        for seat in seats {
            let key = normalize(&seat);
            self.insert(seat, key);
        }
        self
    }

    /// Displayed quantity; always derived from the assigned seats.
    pub fn quantity(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn assigned_seats(&self) -> impl Iterator<Item = &SeatRef> {
        self.seats.iter().map(|(seat, _)| seat)
    }

    pub fn holds(&self, key: &NormKey) -> bool {
        self.index
            .candidates(key)
            .iter()
            .any(|&pos| self.seats[pos].1.matches(key))
    }

    /// Caller has already checked exclusivity. Returns `false` if present.
    pub(crate) fn insert(&mut self, seat: SeatRef, key: NormKey) -> bool {
        if self.holds(&key) {
            return false;
        }
        self.index.insert(&key, self.seats.len());
        self.seats.push((seat, key));
        true
    }

    pub(crate) fn remove(&mut self, key: &NormKey) -> bool {
        let before = self.seats.len();
        self.seats.retain(|(_, k)| !k.matches(key));
        if self.seats.len() == before {
            return false;
        }
        self.index = KeyIndex::build(self.seats.iter().map(|(_, k)| k));
        true
    }

    pub(crate) fn clear(&mut self) {
        self.seats.clear();
        self.index = KeyIndex::default();
    }
}

#[derive(Serialize, Deserialize)]
struct DraftRecord {
    id: CategoryId,
    name: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    assigned_seats: Vec<SeatRef>,
}

impl From<DraftRecord> for TicketCategoryDraft {
    fn from(record: DraftRecord) -> Self {
        TicketCategoryDraft::new(record.id, record.name, record.price).with_seats(record.assigned_seats)
    }
}

impl From<TicketCategoryDraft> for DraftRecord {
    fn from(draft: TicketCategoryDraft) -> Self {
        DraftRecord {
            id: draft.id,
            name: draft.name,
            price: draft.price,
            assigned_seats: draft.seats.into_iter().map(|(seat, _)| seat).collect(),
        }
    }
}

/// Тело запроса "назначить места категории билетов", которое форма
/// отправляет на бэкенд после сабмита.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignSeatsRequest {
    pub category_id: CategoryId,
    pub quantity: usize,
    pub seats: Vec<SeatRef>,
}
