use std::sync::Arc;
use tripbook_core::{PurchaseService, TripService, UserService};
use tripbook_store::app_config::CatalogConfig;
use tripbook_store::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub trips: Arc<TripService>,
    pub purchases: Arc<PurchaseService>,
    pub catalog: CatalogConfig,
}

impl AppState {
    pub fn new(repos: Repositories, catalog: CatalogConfig) -> Self {
        Self {
            users: Arc::new(UserService::new(repos.users)),
            trips: Arc::new(TripService::new(repos.trips)),
            purchases: Arc::new(PurchaseService::new(repos.purchases)),
            catalog,
        }
    }
}
