pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod purchase_repo;
pub mod trip_repo;
pub mod user_repo;

use std::sync::Arc;
use tripbook_core::repository::{PurchaseRepository, TripRepository, UserRepository};

pub use database::DbClient;
pub use memory_repo::InMemoryStore;
pub use purchase_repo::PgPurchaseRepository;
pub use trip_repo::PgTripRepository;
pub use user_repo::PgUserRepository;

/// One backend, seen through the three repository traits.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub trips: Arc<dyn TripRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
}

impl Repositories {
    pub fn postgres(db: &DbClient) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(db.pool.clone())),
            trips: Arc::new(PgTripRepository::new(db.pool.clone())),
            purchases: Arc::new(PgPurchaseRepository::new(db.pool.clone())),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            trips: store.clone(),
            purchases: store,
        }
    }
}
