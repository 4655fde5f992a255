use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::trip::Trip;

/// One user's booking of one trip, with the trip it references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub trip: Trip,
    pub booked_at: DateTime<Utc>,
}

/// Which side of a booking did not exist when the purchase was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingReference {
    #[error("Booking references unknown user: {0}")]
    User(String),
    #[error("Booking references unknown trip: {0}")]
    Trip(i64),
}
