pub mod category;
pub mod seat;
pub mod venue;

pub use category::{AssignSeatsRequest, CategoryId, TicketCategoryDraft};
pub use seat::{CatalogSeat, OccupiedSeat, SeatRef, SeatStatus};
pub use venue::{Area, VenueTemplate};
