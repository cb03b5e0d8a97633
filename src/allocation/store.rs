//! Assignment store: per-category seat sets for one event/session.
//!
//! At most one draft holds a given seat at any time. Only the active draft is
//! ever mutated, and every claim is checked against all the other drafts, so
//! the invariant holds after each single operation.

use serde::Serialize;
use tracing::debug;

use crate::allocation::catalog::Catalog;
use crate::allocation::normalize::{normalize, NormKey};
use crate::allocation::occupancy::Occupancy;
use crate::allocation::AllocationError;
use crate::models::{CategoryId, SeatRef, SeatStatus, TicketCategoryDraft};

/// Why a mutation was ignored. Rejections are not errors: a drag never stops
/// because one seat under it is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "category_id", rename_all = "snake_case")]
pub enum RejectReason {
    NoActiveCategory,
    NotInCatalog,
    /// An area-less reference that fits seats in more than one area.
    Ambiguous,
    Locked,
    Booked,
    ClaimedBy(CategoryId),
}

/// Outcome of [`AssignmentStore::assign`] / [`AssignmentStore::unassign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum Mutation {
    Applied,
    Unchanged,
    Rejected(RejectReason),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentStore {
    catalog: Catalog,
    occupancy: Occupancy,
    drafts: Vec<TicketCategoryDraft>,
    active: Option<CategoryId>,
}

impl AssignmentStore {
    pub fn new(catalog: Catalog, occupancy: Occupancy) -> Self {
        Self {
            catalog,
            occupancy,
            drafts: Vec::new(),
            active: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    pub fn drafts(&self) -> &[TicketCategoryDraft] {
        &self.drafts
    }

    pub fn draft(&self, id: &CategoryId) -> Option<&TicketCategoryDraft> {
        self.drafts.iter().find(|d| &d.id == id)
    }

    pub fn active(&self) -> Option<&CategoryId> {
        self.active.as_ref()
    }

    pub fn active_draft(&self) -> Option<&TicketCategoryDraft> {
        self.active.as_ref().and_then(|id| self.draft(id))
    }

    /// Derived quantity of a category.
    pub fn quantity(&self, id: &CategoryId) -> Option<usize> {
        self.draft(id).map(TicketCategoryDraft::quantity)
    }

    /// Adds a draft and seeds it with the category's existing assignments
    /// from the occupancy snapshot.
    pub fn add_draft(&mut self, draft: TicketCategoryDraft) -> Result<(), AllocationError> {
        self.insert_draft(draft, true)
    }

    /// Adds a draft exactly as it was saved, without occupancy seeding.
    /// Seats that would break exclusivity are still dropped.
    pub fn restore_draft(&mut self, draft: TicketCategoryDraft) -> Result<(), AllocationError> {
        self.insert_draft(draft, false)
    }

    fn insert_draft(&mut self, mut draft: TicketCategoryDraft, seed: bool) -> Result<(), AllocationError> {
        if self.draft(&draft.id).is_some() {
            return Err(AllocationError::DuplicateCategory(draft.id));
        }
        // сид не должен нарушать эксклюзивность относительно уже добавленных черновиков
        let mut seeds: Vec<SeatRef> = draft.assigned_seats().cloned().collect();
        draft.clear();
        if seed {
            seeds.extend(self.occupancy.owned_by(&draft.id).cloned());
        }
        for seat in seeds {
            if let Ok((seat, key)) = self.check_claim(&normalize(&seat), &draft.id) {
                draft.insert(seat, key);
            }
        }
        debug!("Category {} added with {} seats", draft.id, draft.quantity());
        self.drafts.push(draft);
        Ok(())
    }

    pub fn remove_draft(&mut self, id: &CategoryId) -> Result<TicketCategoryDraft, AllocationError> {
        let idx = self
            .drafts
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| AllocationError::UnknownCategory(id.clone()))?;
        if self.active.as_ref() == Some(id) {
            self.active = None;
        }
        Ok(self.drafts.remove(idx))
    }

    pub fn set_active(&mut self, id: Option<CategoryId>) -> Result<(), AllocationError> {
        if let Some(id) = &id {
            if self.draft(id).is_none() {
                return Err(AllocationError::UnknownCategory(id.clone()));
            }
        }
        self.active = id;
        Ok(())
    }

    /// Swaps the venue. Every seat identity of the old venue is void, so all
    /// drafts are emptied and then re-seeded from the new occupancy.
    pub fn replace_venue(&mut self, catalog: Catalog, occupancy: Occupancy) {
        self.catalog = catalog;
        self.occupancy = occupancy;
        let drafts = std::mem::take(&mut self.drafts);
        for mut draft in drafts {
            draft.clear();
            // id уникальны, ошибки дубликата здесь быть не может
            let _ = self.add_draft(draft);
        }
    }

    pub fn is_assigned_to_active(&self, seat: &SeatRef) -> bool {
        self.active_holds(&normalize(seat))
    }

    pub fn is_assigned_to_other(&self, seat: &SeatRef) -> Option<&CategoryId> {
        self.other_holder(&normalize(seat))
    }

    /// Category holding the seat, active or not.
    pub fn owner_of(&self, seat: &SeatRef) -> Option<&CategoryId> {
        let key = normalize(seat);
        self.drafts.iter().find(|d| d.holds(&key)).map(|d| &d.id)
    }

    pub fn status(&self, seat: &SeatRef) -> SeatStatus {
        self.status_of_key(&normalize(seat))
    }

    pub fn assign(&mut self, seat: &SeatRef) -> Mutation {
        let key = normalize(seat);
        self.assign_key(seat, key)
    }

    pub fn unassign(&mut self, seat: &SeatRef) -> Mutation {
        self.unassign_key(&normalize(seat))
    }

    pub(crate) fn status_of_key(&self, key: &NormKey) -> SeatStatus {
        if self.catalog.is_locked(key) {
            SeatStatus::Locked
        } else if self.active_holds(key) {
            SeatStatus::AssignedActive
        } else if self.other_holder(key).is_some() {
            SeatStatus::AssignedOther
        } else if self.occupancy.is_booked(key, self.active.as_ref()) {
            SeatStatus::Booked
        } else {
            SeatStatus::Unassigned
        }
    }

    /// Claims the catalog seat `key` resolves to. The draft stores the
    /// catalog's spelling of the seat, never the caller's.
    pub(crate) fn assign_key(&mut self, seat: &SeatRef, key: NormKey) -> Mutation {
        let Some(active) = self.active.clone() else {
            return Mutation::Rejected(RejectReason::NoActiveCategory);
        };
        let (canonical, canonical_key) = match self.check_claim(&key, &active) {
            Ok(claim) => claim,
            Err(reason) => {
                debug!("assign {} for {} ignored: {:?}", seat, active, reason);
                return Mutation::Rejected(reason);
            }
        };
        let Some(draft) = self.drafts.iter_mut().find(|d| d.id == active) else {
            return Mutation::Rejected(RejectReason::NoActiveCategory);
        };
        if draft.insert(canonical, canonical_key) {
            Mutation::Applied
        } else {
            Mutation::Unchanged
        }
    }

    pub(crate) fn unassign_key(&mut self, key: &NormKey) -> Mutation {
        let Some(active) = self.active.as_ref() else {
            return Mutation::Rejected(RejectReason::NoActiveCategory);
        };
        // снимаем ровно одно место каталога, а не все совпадения без зоны
        let canonical = match self.catalog.resolve(key) {
            Ok((_, canonical)) => canonical.clone(),
            Err(reason) => return Mutation::Rejected(reason),
        };
        let Some(draft) = self.drafts.iter_mut().find(|d| &d.id == active) else {
            return Mutation::Rejected(RejectReason::NoActiveCategory);
        };
        if draft.remove(&canonical) {
            Mutation::Applied
        } else {
            Mutation::Unchanged
        }
    }

    /// The catalog seat `editing` would claim for `key`, or why it may not.
    /// Membership of `editing` itself is not a conflict.
    pub(crate) fn check_claim(&self, key: &NormKey, editing: &CategoryId) -> Result<(SeatRef, NormKey), RejectReason> {
        let (seat, canonical) = self.catalog.resolve(key)?;
        if seat.locked {
            return Err(RejectReason::Locked);
        }
        if self.occupancy.is_booked(canonical, Some(editing)) {
            return Err(RejectReason::Booked);
        }
        if let Some(holder) = self.drafts.iter().find(|d| &d.id != editing && d.holds(canonical)) {
            return Err(RejectReason::ClaimedBy(holder.id.clone()));
        }
        Ok((seat.seat.clone(), canonical.clone()))
    }

    pub(crate) fn active_holds(&self, key: &NormKey) -> bool {
        self.active_draft().is_some_and(|d| d.holds(key))
    }

    pub(crate) fn other_holder(&self, key: &NormKey) -> Option<&CategoryId> {
        self.drafts
            .iter()
            .filter(|d| Some(&d.id) != self.active.as_ref())
            .find(|d| d.holds(key))
            .map(|d| &d.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Area, OccupiedSeat, VenueTemplate};

    fn seat(row: &str, number: &str) -> SeatRef {
        SeatRef::new(row, number, Some("VIP"))
    }

    fn store() -> AssignmentStore {
        let template = VenueTemplate::Areas {
            areas: vec![Area {
                name: "VIP".to_string(),
                rows: 3,
                cols: 4,
                locked_seat_ids: ["1-4".to_string()].into_iter().collect(),
            }],
        };
        let occupancy = Occupancy::new([OccupiedSeat { seat: seat("B", "1"), category_id: None }]);
        let mut store = AssignmentStore::new(Catalog::expand(Some(&template)), occupancy);
        store.add_draft(TicketCategoryDraft::new("a".into(), "Standard", 100.0)).unwrap();
        store.add_draft(TicketCategoryDraft::new("b".into(), "Premium", 250.0)).unwrap();
        store
    }

    #[test]
    fn assign_and_unassign_are_idempotent() {
        let mut store = store();
        store.set_active(Some("a".into())).unwrap();

        assert_eq!(store.assign(&seat("A", "1")), Mutation::Applied);
        assert_eq!(store.assign(&seat("a", "01")), Mutation::Unchanged);
        assert_eq!(store.quantity(&"a".into()), Some(1));

        assert_eq!(store.unassign(&seat("A", "1")), Mutation::Applied);
        assert_eq!(store.unassign(&seat("A", "1")), Mutation::Unchanged);
        assert_eq!(store.quantity(&"a".into()), Some(0));
    }

    #[test]
    fn seat_held_by_another_category_cannot_be_claimed() {
        let mut store = store();
        store.set_active(Some("b".into())).unwrap();
        store.assign(&seat("C", "1"));

        store.set_active(Some("a".into())).unwrap();
        assert_eq!(
            store.assign(&seat("C", "1")),
            Mutation::Rejected(RejectReason::ClaimedBy("b".into()))
        );
        assert_eq!(store.quantity(&"a".into()), Some(0));
        assert_eq!(store.quantity(&"b".into()), Some(1));
        assert_eq!(store.is_assigned_to_other(&seat("C", "1")), Some(&CategoryId::from("b")));
        assert_eq!(store.status(&seat("C", "1")), SeatStatus::AssignedOther);
    }

    #[test]
    fn locked_booked_and_unknown_seats_are_rejected() {
        let mut store = store();
        store.set_active(Some("a".into())).unwrap();

        assert_eq!(store.assign(&seat("A", "4")), Mutation::Rejected(RejectReason::Locked));
        assert_eq!(store.assign(&seat("B", "1")), Mutation::Rejected(RejectReason::Booked));
        assert_eq!(store.assign(&seat("Z", "9")), Mutation::Rejected(RejectReason::NotInCatalog));
        assert!(store.active_draft().is_some_and(|d| d.is_empty()));
    }

    #[test]
    fn area_less_references_claim_one_catalog_seat() {
        let template = VenueTemplate::Areas {
            areas: ["VIP", "STD"]
                .into_iter()
                .map(|name| Area {
                    name: name.to_string(),
                    rows: 1,
                    cols: 2,
                    locked_seat_ids: ["1-2".to_string()].into_iter().filter(|_| name == "STD").collect(),
                })
                .collect(),
        };
        let mut store = AssignmentStore::new(Catalog::expand(Some(&template)), Occupancy::empty());
        store.add_draft(TicketCategoryDraft::new("a".into(), "A", 1.0)).unwrap();
        store.add_draft(TicketCategoryDraft::new("b".into(), "B", 1.0)).unwrap();
        store.set_active(Some("a".into())).unwrap();

        // A1 есть в обеих зонах
        let bare = SeatRef::new("A", "1", None);
        assert_eq!(store.assign(&bare), Mutation::Rejected(RejectReason::Ambiguous));
        assert_eq!(store.quantity(&"a".into()), Some(0));

        // A2 свободно только в VIP, но ссылка без зоны все равно неоднозначна
        assert_eq!(store.assign(&SeatRef::new("A", "2", None)), Mutation::Rejected(RejectReason::Ambiguous));

        assert_eq!(store.assign(&SeatRef::new("a", "01", Some("Khu VIP"))), Mutation::Applied);
        let held: Vec<&SeatRef> = store.active_draft().map(|d| d.assigned_seats().collect()).unwrap_or_default();
        assert_eq!(held, [&SeatRef::new("A", "1", Some("VIP"))]);

        store.set_active(Some("b".into())).unwrap();
        assert_eq!(store.assign(&SeatRef::new("A", "1", Some("STD"))), Mutation::Applied);
        assert_eq!(store.status(&SeatRef::new("A", "1", Some("VIP"))), SeatStatus::AssignedOther);
        assert_eq!(store.status(&SeatRef::new("A", "1", Some("STD"))), SeatStatus::AssignedActive);
        assert_eq!(store.unassign(&bare), Mutation::Rejected(RejectReason::Ambiguous));
        assert_eq!(store.quantity(&"b".into()), Some(1));
    }

    #[test]
    fn nothing_changes_without_an_active_category() {
        let mut store = store();
        assert_eq!(store.assign(&seat("A", "1")), Mutation::Rejected(RejectReason::NoActiveCategory));
        assert_eq!(store.unassign(&seat("A", "1")), Mutation::Rejected(RejectReason::NoActiveCategory));
    }

    #[test]
    fn status_is_derived_per_active_category() {
        let mut store = store();
        store.set_active(Some("a".into())).unwrap();
        store.assign(&seat("A", "1"));

        assert_eq!(store.status(&seat("A", "1")), SeatStatus::AssignedActive);
        assert_eq!(store.status(&seat("A", "2")), SeatStatus::Unassigned);
        assert_eq!(store.status(&seat("A", "4")), SeatStatus::Locked);
        assert_eq!(store.status(&seat("B", "1")), SeatStatus::Booked);

        store.set_active(Some("b".into())).unwrap();
        assert_eq!(store.status(&seat("A", "1")), SeatStatus::AssignedOther);
        assert_eq!(store.owner_of(&seat("A", "1")), Some(&CategoryId::from("a")));
    }

    #[test]
    fn existing_assignments_seed_their_category() {
        let template = VenueTemplate::Itemized {
            seats: vec![SeatRef::new("A", "1", None), SeatRef::new("A", "2", None)],
        };
        let occupancy = Occupancy::new([
            OccupiedSeat { seat: SeatRef::new("A", "1", Some("Hall")), category_id: Some("gold".into()) },
            OccupiedSeat { seat: SeatRef::new("A", "2", None), category_id: Some("silver".into()) },
        ]);
        let mut store = AssignmentStore::new(Catalog::expand(Some(&template)), occupancy);
        store.add_draft(TicketCategoryDraft::new("gold".into(), "Gold", 1.0)).unwrap();

        assert_eq!(store.quantity(&"gold".into()), Some(1));
        store.set_active(Some("gold".into())).unwrap();
        assert_eq!(store.status(&SeatRef::new("A", "1", None)), SeatStatus::AssignedActive);
        assert_eq!(store.status(&SeatRef::new("A", "2", None)), SeatStatus::Booked);
    }

    #[test]
    fn duplicate_and_unknown_categories_are_errors() {
        let mut store = store();
        assert!(matches!(
            store.add_draft(TicketCategoryDraft::new("a".into(), "Again", 1.0)),
            Err(AllocationError::DuplicateCategory(_))
        ));
        assert!(matches!(
            store.set_active(Some("zzz".into())),
            Err(AllocationError::UnknownCategory(_))
        ));
    }

    #[test]
    fn removing_active_draft_deactivates() {
        let mut store = store();
        store.set_active(Some("a".into())).unwrap();
        store.remove_draft(&"a".into()).unwrap();
        assert!(store.active().is_none());
        assert_eq!(store.drafts().len(), 1);
    }

    #[test]
    fn replacing_venue_clears_all_drafts() {
        let mut store = store();
        store.set_active(Some("a".into())).unwrap();
        store.assign(&seat("A", "1"));
        store.set_active(Some("b".into())).unwrap();
        store.assign(&seat("A", "2"));

        let other = VenueTemplate::Itemized { seats: vec![SeatRef::new("A", "1", None)] };
        store.replace_venue(Catalog::expand(Some(&other)), Occupancy::empty());

        assert!(store.drafts().iter().all(TicketCategoryDraft::is_empty));
        assert_eq!(store.active(), Some(&CategoryId::from("b")));
    }
}
