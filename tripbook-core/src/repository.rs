use async_trait::async_trait;

use crate::password::HashedPassword;
use crate::purchase::MissingReference;
use crate::trip::{NewTrip, Trip};
use crate::user::{NewUser, User};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// A validated registration, ready to be written. Holds the hash, never the password.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub email: String,
    pub firstname: String,
    pub middle_name: String,
    pub surname: String,
    pub address: String,
    pub postal_code: String,
    pub password_hash: HashedPassword,
    pub enabled: bool,
}

impl UserRecord {
    pub fn new(user: NewUser, password_hash: HashedPassword) -> Self {
        Self {
            email: user.email,
            firstname: user.firstname,
            middle_name: user.middle_name,
            surname: user.surname,
            address: user.address,
            postal_code: user.postal_code,
            password_hash,
            enabled: true,
        }
    }
}

/// Repository trait for user data access
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts unless the email is already taken. The check and the write are
    /// one atomic step; `Ok(false)` means nothing was written.
    async fn insert_user(&self, user: &UserRecord) -> RepoResult<bool>;

    async fn find_user(&self, email: &str, with_purchases: bool) -> RepoResult<Option<User>>;

    /// All users in registration order.
    async fn list_users(&self, with_purchases: bool) -> RepoResult<Vec<User>>;

    /// Removes the user together with its purchases.
    /// Returns the number of purchases removed, or `None` if no such user.
    async fn delete_user(&self, email: &str) -> RepoResult<Option<u64>>;
}

/// Repository trait for the trip catalog
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn insert_trip(&self, trip: &NewTrip) -> RepoResult<i64>;

    async fn find_trip(&self, id: i64) -> RepoResult<Option<Trip>>;

    /// Most booked first, ties by id ascending.
    async fn top_trips_by_bookings(&self, limit: u32) -> RepoResult<Vec<Trip>>;

    /// Exact location match, cheapest first, ties by id ascending.
    async fn trips_at_location_by_cost(&self, location: &str) -> RepoResult<Vec<Trip>>;
}

/// Repository trait for purchases
#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    /// Reads both sides and writes the purchase as one unit of work.
    /// The inner `Err` names whichever side was missing; nothing is written then.
    async fn create_purchase(
        &self,
        email: &str,
        trip_id: i64,
    ) -> RepoResult<Result<i64, MissingReference>>;
}
