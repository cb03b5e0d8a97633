//! Whole-area select/deselect for the active category.
//!
//! Only full coverage of the available seats deselects. Any partial selection
//! selects the remainder.

use serde::Serialize;
use tracing::debug;

use crate::allocation::normalize::{normalize, NormKey};
use crate::allocation::store::AssignmentStore;
use crate::models::SeatRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "seats", rename_all = "snake_case")]
pub enum AreaToggle {
    Selected(usize),
    Deselected(usize),
    /// No active category, or nothing in the area is available to it.
    Unchanged,
}

/// Toggles `seats_in_area` for the active category.
///
/// Seats that are locked, booked, outside the catalog or held by another
/// category are not available and are never touched.
pub fn toggle_area(store: &mut AssignmentStore, area: &str, seats_in_area: &[SeatRef]) -> AreaToggle {
    let Some(active) = store.active().cloned() else {
        return AreaToggle::Unchanged;
    };

    let mut available: Vec<(&SeatRef, NormKey)> = Vec::with_capacity(seats_in_area.len());
    for seat in seats_in_area {
        let key = normalize(seat);
        if available.iter().any(|(_, k)| k.matches(&key)) {
            continue;
        }
        if store.check_claim(&key, &active).is_ok() {
            available.push((seat, key));
        }
    }
    if available.is_empty() {
        debug!("Area '{}' has no seats available to {}", area, active);
        return AreaToggle::Unchanged;
    }

    let selected = available.iter().filter(|(_, key)| store.active_holds(key)).count();
    if selected == available.len() {
        for (_, key) in &available {
            store.unassign_key(key);
        }
        debug!("Area '{}': {} seats deselected for {}", area, available.len(), active);
        return AreaToggle::Deselected(available.len());
    }

    let mut added = 0;
    for (seat, key) in available {
        if store.assign_key(seat, key).is_applied() {
            added += 1;
        }
    }
    debug!("Area '{}': {} seats selected for {}", area, added, active);
    AreaToggle::Selected(added)
}

/// [`toggle_area`] over the catalog seats of `area`.
pub fn toggle_catalog_area(store: &mut AssignmentStore, area: &str) -> AreaToggle {
    let seats: Vec<SeatRef> = store
        .catalog()
        .seats_in_area(area)
        .into_iter()
        .map(|s| s.seat.clone())
        .collect();
    toggle_area(store, area, &seats)
}
