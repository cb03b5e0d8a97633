//! Click-and-drag selection over the seat grid.
//!
//! A drag is an explicit [`DragSession`]: it starts on pointer-down, fixes its
//! mode from the seat under the pointer at that moment, applies that mode to
//! every eligible seat the pointer enters, and ends on the first release seen
//! anywhere in the viewport. The release arrives through a [`ReleaseSignal`]
//! handed to the host when the drag starts, so a pointer-up outside the grid
//! still ends the gesture.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::allocation::normalize::normalize;
use crate::allocation::store::{AssignmentStore, Mutation};
use crate::models::{SeatRef, SeatStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    Select,
    Deselect,
}

/// Monotonic id of one pointer-down .. release gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureId(pub u64);

/// Viewport-wide release notification for the lifetime of one drag.
///
/// Clones share the flag. Once released it stays released; a new drag gets a
/// new signal.
#[derive(Debug, Clone, Default)]
pub struct ReleaseSignal(Arc<AtomicBool>);

impl ReleaseSignal {
    pub fn release(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_released(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct DragSession {
    pub gesture: GestureId,
    pub mode: DragMode,
    pub origin: SeatRef,
    signal: ReleaseSignal,
}

impl DragSession {
    pub fn signal(&self) -> &ReleaseSignal {
        &self.signal
    }
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PointerOutcome {
    /// Pointer-down began a drag; the origin seat already got the mode applied.
    Started {
        gesture: GestureId,
        mode: DragMode,
        mutation: Mutation,
    },
    /// Pointer-enter during a drag.
    Applied { mode: DragMode, mutation: Mutation },
    /// Seat is locked or held by another category.
    Inert { status: SeatStatus },
    /// No drag in progress, stale gesture, or nothing to edit.
    Ignored,
}

#[derive(Debug, Default)]
pub struct SelectionController {
    drag: Option<DragSession>,
    last_gesture: u64,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller whose next gesture id follows `last_gesture`, so ids handed
    /// out before a restore can never match a new drag.
    pub fn resume(last_gesture: u64) -> Self {
        Self {
            drag: None,
            last_gesture,
        }
    }

    pub fn last_gesture(&self) -> u64 {
        self.last_gesture
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| !d.signal.is_released())
    }

    pub fn current(&self) -> Option<&DragSession> {
        self.drag.as_ref().filter(|d| !d.signal.is_released())
    }

    pub fn pointer_down(&mut self, store: &mut AssignmentStore, seat: &SeatRef) -> PointerOutcome {
        // пропущенный pointer-up: предыдущий жест завершаем, возобновить его нельзя
        if let Some(previous) = self.drag.take() {
            debug!("Gesture {:?} superseded by a new pointer-down", previous.gesture);
            previous.signal.release();
        }

        if store.active().is_none() {
            return PointerOutcome::Ignored;
        }

        let key = normalize(seat);
        let status = store.status_of_key(&key);
        if status.is_inert() {
            return PointerOutcome::Inert { status };
        }

        let mode = if status == SeatStatus::AssignedActive {
            DragMode::Deselect
        } else {
            DragMode::Select
        };
        self.last_gesture += 1;
        let gesture = GestureId(self.last_gesture);

        let mutation = match mode {
            DragMode::Select => store.assign_key(seat, key),
            DragMode::Deselect => store.unassign_key(&key),
        };
        debug!("Gesture {:?} started on {} in {:?} mode", gesture, seat, mode);

        self.drag = Some(DragSession {
            gesture,
            mode,
            origin: seat.clone(),
            signal: ReleaseSignal::default(),
        });
        PointerOutcome::Started { gesture, mode, mutation }
    }

    /// Pointer entered `seat`. When `gesture` is given it must be the current
    /// one, so events of a finished drag can never resume it.
    pub fn pointer_enter(
        &mut self,
        store: &mut AssignmentStore,
        seat: &SeatRef,
        gesture: Option<GestureId>,
    ) -> PointerOutcome {
        let Some(drag) = self.drag.as_ref() else {
            return PointerOutcome::Ignored;
        };
        if drag.signal.is_released() {
            debug!("Gesture {:?} was released, dropping session", drag.gesture);
            self.drag = None;
            return PointerOutcome::Ignored;
        }
        if gesture.is_some_and(|g| g != drag.gesture) {
            return PointerOutcome::Ignored;
        }

        let mode = drag.mode;
        let key = normalize(seat);
        let status = store.status_of_key(&key);
        if status.is_inert() {
            return PointerOutcome::Inert { status };
        }

        let mutation = match mode {
            DragMode::Select => store.assign_key(seat, key),
            DragMode::Deselect => store.unassign_key(&key),
        };
        PointerOutcome::Applied { mode, mutation }
    }

    /// Pointer released anywhere. Terminal for the current gesture.
    pub fn release(&mut self) -> Option<DragSession> {
        let drag = self.drag.take()?;
        drag.signal.release();
        debug!("Gesture {:?} released", drag.gesture);
        Some(drag)
    }
}
