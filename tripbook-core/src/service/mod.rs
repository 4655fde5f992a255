//! Booking services. Each takes its repositories by constructor and treats
//! one call as one unit of work against the store.

mod purchase;
mod trip;
mod user;

pub use purchase::PurchaseService;
pub use trip::TripService;
pub use user::UserService;
