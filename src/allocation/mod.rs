//! Venue seat-template allocation engine.
//!
//! Dependency order: [`normalize`] → [`catalog`] / [`occupancy`] → [`store`] →
//! ([`selection`], [`bulk`]) → [`session`]. Everything here is synchronous and
//! operates on in-memory state only.

pub mod bulk;
pub mod catalog;
pub mod normalize;
pub mod occupancy;
pub mod selection;
pub mod session;
pub mod store;

pub use bulk::AreaToggle;
pub use catalog::Catalog;
pub use normalize::{normalize, same_seat, NormKey};
pub use occupancy::Occupancy;
pub use selection::{DragMode, GestureId, PointerOutcome, ReleaseSignal, SelectionController};
pub use session::{AllocationSession, SeatView, SessionMode, SessionSnapshot};
pub use store::{AssignmentStore, Mutation, RejectReason};

use crate::models::CategoryId;

/// Errors of category-level session operations. Seat mutations never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("unknown ticket category {0}")]
    UnknownCategory(CategoryId),
    #[error("ticket category {0} already exists")]
    DuplicateCategory(CategoryId),
    #[error("allocation session is read-only")]
    ReadOnly,
}
