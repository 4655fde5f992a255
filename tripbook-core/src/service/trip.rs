use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::repository::TripRepository;
use crate::trip::{NewTrip, Trip};
use crate::{CoreError, CoreResult};

/// Trip catalog: creation and the two browse queries.
pub struct TripService {
    repo: Arc<dyn TripRepository>,
}

impl TripService {
    pub fn new(repo: Arc<dyn TripRepository>) -> Self {
        Self { repo }
    }

    /// Stores a trip after trimming its text fields, so it is found by the
    /// same label a location query is normalized to.
    pub async fn create_trip(&self, trip: NewTrip) -> CoreResult<i64> {
        let trip = trip.trimmed();
        let violations = trip.validate();
        if !violations.is_empty() {
            warn!(location = %trip.location, %violations, "Rejected invalid trip");
            return Err(CoreError::Validation(violations));
        }

        let id = self.repo.insert_trip(&trip).await.map_err(CoreError::storage)?;
        info!(trip_id = id, location = %trip.location, cost = trip.cost, "Trip created");
        Ok(id)
    }

    pub async fn get_trip(&self, id: i64) -> CoreResult<Trip> {
        self.repo
            .find_trip(id)
            .await
            .map_err(CoreError::storage)?
            .ok_or_else(|| CoreError::not_found("Trip", id))
    }

    /// The `n` most booked trips; equally booked trips come in id order.
    pub async fn get_top_n_trips(&self, n: u32) -> CoreResult<Vec<Trip>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        debug!(n, "Fetching top trips");
        self.repo
            .top_trips_by_bookings(n)
            .await
            .map_err(CoreError::storage)
    }

    /// Trips whose location equals the trimmed query, cheapest first.
    pub async fn get_by_location_order_by_cost_ascending(&self, location: &str) -> CoreResult<Vec<Trip>> {
        let location = location.trim();
        if location.is_empty() {
            return Ok(Vec::new());
        }
        debug!(location, "Fetching trips by location");
        self.repo
            .trips_at_location_by_cost(location)
            .await
            .map_err(CoreError::storage)
    }
}
