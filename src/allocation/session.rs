//! One allocation session: a venue, the event's occupancy, the category drafts
//! and the drag controller.
//!
//! The organizer create flow, the showtime-add flow and the admin inspection
//! views all run on this type. Inspection views open it in
//! [`SessionMode::ReadOnly`], where no category can ever become active and so
//! nothing can be mutated.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::allocation::bulk::{toggle_catalog_area, AreaToggle};
use crate::allocation::catalog::Catalog;
use crate::allocation::occupancy::Occupancy;
use crate::allocation::selection::{GestureId, PointerOutcome, SelectionController};
use crate::allocation::store::AssignmentStore;
use crate::allocation::AllocationError;
use crate::models::{
    AssignSeatsRequest, CatalogSeat, CategoryId, OccupiedSeat, SeatRef, SeatStatus, TicketCategoryDraft,
    VenueTemplate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    #[default]
    Editable,
    ReadOnly,
}

/// Catalog seat with its derived status, for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatView {
    #[serde(flatten)]
    pub seat: CatalogSeat,
    pub status: SeatStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
}

/// Persistable state of a session. A drag in progress is not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: SessionMode,
    pub template: Option<VenueTemplate>,
    #[serde(default)]
    pub occupied: Vec<OccupiedSeat>,
    #[serde(default)]
    pub drafts: Vec<TicketCategoryDraft>,
    #[serde(default)]
    pub active: Option<CategoryId>,
    /// Last gesture id handed out; a restored session continues after it.
    #[serde(default)]
    pub last_gesture: u64,
}

#[derive(Debug)]
pub struct AllocationSession {
    mode: SessionMode,
    template: Option<VenueTemplate>,
    fingerprint: Option<String>,
    store: AssignmentStore,
    controller: SelectionController,
}

impl AllocationSession {
    pub fn open(
        template: Option<VenueTemplate>,
        occupied: Vec<OccupiedSeat>,
        drafts: Vec<TicketCategoryDraft>,
        mode: SessionMode,
    ) -> Result<Self, AllocationError> {
        let catalog = Catalog::expand(template.as_ref());
        info!(
            "Opening {:?} allocation session: {} seats, {} occupied, {} categories",
            mode,
            catalog.len(),
            occupied.len(),
            drafts.len()
        );
        let mut store = AssignmentStore::new(catalog, Occupancy::new(occupied));
        for draft in drafts {
            store.add_draft(draft)?;
        }
        Ok(Self {
            mode,
            fingerprint: template.as_ref().map(VenueTemplate::fingerprint),
            template,
            store,
            controller: SelectionController::new(),
        })
    }

    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, AllocationError> {
        let catalog = Catalog::expand(snapshot.template.as_ref());
        let mut store = AssignmentStore::new(catalog, Occupancy::new(snapshot.occupied));
        for draft in snapshot.drafts {
            store.restore_draft(draft)?;
        }
        if snapshot.mode == SessionMode::Editable {
            store.set_active(snapshot.active)?;
        }
        Ok(Self {
            mode: snapshot.mode,
            fingerprint: snapshot.template.as_ref().map(VenueTemplate::fingerprint),
            template: snapshot.template,
            store,
            controller: SelectionController::resume(snapshot.last_gesture),
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            template: self.template.clone(),
            occupied: self.store.occupancy().seats().cloned().collect(),
            drafts: self.store.drafts().to_vec(),
            active: self.store.active().cloned(),
            last_gesture: self.controller.last_gesture(),
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn template(&self) -> Option<&VenueTemplate> {
        self.template.as_ref()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    pub fn drafts(&self) -> &[TicketCategoryDraft] {
        self.store.drafts()
    }

    pub fn active(&self) -> Option<&CategoryId> {
        self.store.active()
    }

    pub fn controller(&self) -> &SelectionController {
        &self.controller
    }

    pub fn add_category(&mut self, draft: TicketCategoryDraft) -> Result<(), AllocationError> {
        self.ensure_editable()?;
        self.store.add_draft(draft)
    }

    pub fn remove_category(&mut self, id: &CategoryId) -> Result<TicketCategoryDraft, AllocationError> {
        self.ensure_editable()?;
        if self.store.active() == Some(id) {
            self.controller.release();
        }
        self.store.remove_draft(id)
    }

    /// Makes `id` the only editable category, or none. Ends any drag.
    pub fn activate(&mut self, id: Option<CategoryId>) -> Result<(), AllocationError> {
        if id.is_some() {
            self.ensure_editable()?;
        }
        self.controller.release();
        self.store.set_active(id)
    }

    /// Switches the venue. Returns `false` when the template is the same
    /// one; otherwise every draft loses its seats.
    pub fn change_venue(
        &mut self,
        template: Option<VenueTemplate>,
        occupied: Vec<OccupiedSeat>,
    ) -> Result<bool, AllocationError> {
        self.ensure_editable()?;
        let fingerprint = template.as_ref().map(VenueTemplate::fingerprint);
        if fingerprint == self.fingerprint {
            debug!("Venue unchanged, keeping drafts");
            return Ok(false);
        }
        self.controller.release();
        let catalog = Catalog::expand(template.as_ref());
        info!("Venue changed, {} seats in new catalog, drafts cleared", catalog.len());
        self.store.replace_venue(catalog, Occupancy::new(occupied));
        self.template = template;
        self.fingerprint = fingerprint;
        Ok(true)
    }

    pub fn status(&self, seat: &SeatRef) -> SeatStatus {
        self.store.status(seat)
    }

    /// Every catalog seat with its status and owning category.
    pub fn board(&self) -> Vec<SeatView> {
        self.store
            .catalog()
            .entries()
            .map(|(seat, key)| SeatView {
                seat: seat.clone(),
                status: self.store.status_of_key(key),
                category_id: self
                    .store
                    .drafts()
                    .iter()
                    .find(|d| d.holds(key))
                    .map(|d| d.id.clone()),
            })
            .collect()
    }

    pub fn pointer_down(&mut self, seat: &SeatRef) -> PointerOutcome {
        self.controller.pointer_down(&mut self.store, seat)
    }

    pub fn pointer_enter(&mut self, seat: &SeatRef, gesture: Option<GestureId>) -> PointerOutcome {
        self.controller.pointer_enter(&mut self.store, seat, gesture)
    }

    /// Pointer released anywhere in the viewport.
    pub fn release(&mut self) -> Option<GestureId> {
        self.controller.release().map(|drag| drag.gesture)
    }

    pub fn toggle_area(&mut self, area: &str) -> AreaToggle {
        toggle_catalog_area(&mut self.store, area)
    }

    /// One assign request per category. Reading it does not consume the
    /// drafts, so a rejected submission can be retried as is.
    pub fn submission(&self) -> Vec<AssignSeatsRequest> {
        if self.mode == SessionMode::ReadOnly {
            return Vec::new();
        }
        self.store
            .drafts()
            .iter()
            .map(|draft| AssignSeatsRequest {
                category_id: draft.id.clone(),
                quantity: draft.quantity(),
                seats: draft.assigned_seats().cloned().collect(),
            })
            .collect()
    }

    fn ensure_editable(&self) -> Result<(), AllocationError> {
        match self.mode {
            SessionMode::Editable => Ok(()),
            SessionMode::ReadOnly => Err(AllocationError::ReadOnly),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Area;

    fn template(name: &str) -> VenueTemplate {
        VenueTemplate::Areas {
            areas: vec![Area {
                name: name.to_string(),
                rows: 2,
                cols: 2,
                locked_seat_ids: Default::default(),
            }],
        }
    }

    fn categories() -> Vec<TicketCategoryDraft> {
        vec![
            TicketCategoryDraft::new("a".into(), "A", 10.0),
            TicketCategoryDraft::new("b".into(), "B", 20.0),
        ]
    }

    #[test]
    fn read_only_sessions_never_activate() {
        let occupied = vec![OccupiedSeat {
            seat: SeatRef::new("A", "1", None),
            category_id: Some("a".into()),
        }];
        let mut session =
            AllocationSession::open(Some(template("Hall")), occupied, categories(), SessionMode::ReadOnly).unwrap();

        assert_eq!(session.activate(Some("a".into())), Err(AllocationError::ReadOnly));
        assert!(session.activate(None).is_ok());
        assert_eq!(session.pointer_down(&SeatRef::new("A", "2", None)), PointerOutcome::Ignored);
        assert_eq!(session.toggle_area("Hall"), AreaToggle::Unchanged);
        assert!(session.submission().is_empty());

        let board = session.board();
        assert_eq!(board[0].status, SeatStatus::AssignedOther);
        assert_eq!(board[0].category_id, Some(CategoryId::from("a")));
    }

    #[test]
    fn changing_venue_clears_drafts_but_same_venue_does_not() {
        let mut session =
            AllocationSession::open(Some(template("Hall")), Vec::new(), categories(), SessionMode::Editable).unwrap();
        session.activate(Some("a".into())).unwrap();
        session.toggle_area("Hall");
        assert_eq!(session.store().quantity(&"a".into()), Some(4));

        assert_eq!(session.change_venue(Some(template("Hall")), Vec::new()), Ok(false));
        assert_eq!(session.store().quantity(&"a".into()), Some(4));

        assert_eq!(session.change_venue(Some(template("Arena")), Vec::new()), Ok(true));
        assert_eq!(session.store().quantity(&"a".into()), Some(0));
        assert_eq!(session.catalog().areas(), ["Arena"]);
    }

    #[test]
    fn submission_reports_every_category_without_consuming() {
        let mut session =
            AllocationSession::open(Some(template("Hall")), Vec::new(), categories(), SessionMode::Editable).unwrap();
        session.activate(Some("b".into())).unwrap();
        session.pointer_down(&SeatRef::new("B", "2", Some("Hall")));
        session.release();

        let requests = session.submission();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].quantity, 0);
        assert_eq!(requests[1].category_id, CategoryId::from("b"));
        assert_eq!(requests[1].seats, vec![SeatRef::new("B", "2", Some("Hall"))]);
        assert_eq!(session.submission(), requests);
    }

    #[test]
    fn snapshot_restores_drafts_without_reseeding() {
        let occupied = vec![OccupiedSeat {
            seat: SeatRef::new("A", "1", Some("Hall")),
            category_id: Some("a".into()),
        }];
        let mut session =
            AllocationSession::open(Some(template("Hall")), occupied, categories(), SessionMode::Editable).unwrap();
        session.activate(Some("a".into())).unwrap();
        assert_eq!(session.status(&SeatRef::new("A", "1", None)), SeatStatus::AssignedActive);

        // организатор снял ранее назначенное место
        session.pointer_down(&SeatRef::new("A", "1", Some("Hall")));
        session.release();

        let snapshot = session.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let restored = AllocationSession::restore(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.active(), Some(&CategoryId::from("a")));
        assert_eq!(restored.controller().last_gesture(), session.controller().last_gesture());
        assert_eq!(restored.store().quantity(&"a".into()), Some(0));
        assert_eq!(restored.fingerprint(), session.fingerprint());
    }

    #[test]
    fn activating_another_category_ends_the_drag() {
        let mut session =
            AllocationSession::open(Some(template("Hall")), Vec::new(), categories(), SessionMode::Editable).unwrap();
        session.activate(Some("a".into())).unwrap();
        session.pointer_down(&SeatRef::new("A", "1", Some("Hall")));
        assert!(session.controller().is_dragging());

        session.activate(Some("b".into())).unwrap();
        assert!(!session.controller().is_dragging());
        assert_eq!(session.pointer_enter(&SeatRef::new("A", "2", Some("Hall")), None), PointerOutcome::Ignored);
    }

    #[test]
    fn malformed_template_means_no_seats() {
        let template = VenueTemplate::from_value(&serde_json::json!({"nope": true}));
        let mut session = AllocationSession::open(template, Vec::new(), categories(), SessionMode::Editable).unwrap();
        session.activate(Some("a".into())).unwrap();
        assert!(session.board().is_empty());
        assert!(matches!(session.pointer_down(&SeatRef::new("A", "1", None)), PointerOutcome::Started { .. }));
        assert_eq!(session.store().quantity(&"a".into()), Some(0));
    }
}
