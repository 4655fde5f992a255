use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::validation::{self, Violations};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub origin: String,
    pub destination: String,
    pub cost: i32,
    pub location: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl NewTrip {
    pub fn validate(&self) -> Violations {
        validation::validate_trip(self)
    }

    /// Strips surrounding whitespace from the text fields, matching how
    /// location queries are normalized.
    pub fn trimmed(self) -> Self {
        Self {
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            location: self.location.trim().to_string(),
            ..self
        }
    }
}

/// A bookable itinerary. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub cost: i32,
    pub location: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl Trip {
    pub fn from_new(id: i64, new: NewTrip) -> Self {
        Self {
            id,
            origin: new.origin,
            destination: new.destination,
            cost: new.cost,
            location: new.location,
            departure_date: new.departure_date,
            return_date: new.return_date,
        }
    }
}
