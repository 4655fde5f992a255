pub mod password;
pub mod purchase;
pub mod repository;
pub mod service;
pub mod trip;
pub mod user;
pub mod validation;

pub use purchase::{MissingReference, Purchase};
pub use service::{PurchaseService, TripService, UserService};
pub use trip::{NewTrip, Trip};
pub use user::{NewUser, Purchases, PurchasesNotLoaded, User};
pub use validation::{Rule, Violations};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(Violations),
    #[error("Email already registered: {email}")]
    Duplicate { email: String },
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error(transparent)]
    Referential(#[from] MissingReference),
    #[error(transparent)]
    NotLoaded(#[from] PurchasesNotLoaded),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn storage(err: repository::RepoError) -> Self {
        tracing::error!("Storage failure: {}", err);
        CoreError::Storage(err.to_string())
    }

    /// True for plain lookup misses and for bookings that reference a missing row.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. } | CoreError::Referential(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
