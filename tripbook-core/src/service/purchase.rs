use std::sync::Arc;
use tracing::{info, warn};

use crate::repository::PurchaseRepository;
use crate::{CoreError, CoreResult};

pub struct PurchaseService {
    repo: Arc<dyn PurchaseRepository>,
}

impl PurchaseService {
    pub fn new(repo: Arc<dyn PurchaseRepository>) -> Self {
        Self { repo }
    }

    /// Books `trip_id` for the user registered as `email`.
    ///
    /// Both must exist; otherwise a referential error is returned and no
    /// purchase is created.
    pub async fn book_trip(&self, email: &str, trip_id: i64) -> CoreResult<i64> {
        match self
            .repo
            .create_purchase(email, trip_id)
            .await
            .map_err(CoreError::storage)?
        {
            Ok(purchase_id) => {
                info!(purchase_id, trip_id, email, "Trip booked");
                Ok(purchase_id)
            }
            Err(missing) => {
                warn!(trip_id, email, "Booking rejected: {}", missing);
                Err(CoreError::Referential(missing))
            }
        }
    }
}
