use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tripbook_core::purchase::{MissingReference, Purchase};
use tripbook_core::repository::{
    PurchaseRepository, RepoResult, TripRepository, UserRecord, UserRepository,
};
use tripbook_core::trip::{NewTrip, Trip};
use tripbook_core::user::{Purchases, User};

/// Process-local store implementing every repository trait.
///
/// All tables sit behind one lock and every operation holds it for its whole
/// duration, so check-then-write sequences cannot interleave.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    trips: BTreeMap<i64, Trip>,
    purchases: Vec<StoredPurchase>,
    last_user_id: i64,
    last_trip_id: i64,
    last_purchase_id: i64,
}

struct StoredUser {
    id: i64,
    record: UserRecord,
}

struct StoredPurchase {
    id: i64,
    user_id: i64,
    trip_id: i64,
    booked_at: DateTime<Utc>,
}

fn next_id(last: &mut i64) -> i64 {
    *last += 1;
    *last
}

impl Tables {
    fn user_by_email(&self, email: &str) -> Option<&StoredUser> {
        self.users.iter().find(|u| u.record.email == email)
    }

    // Purchases are appended with increasing ids, so insertion order is booking order.
    fn purchases_of(&self, user_id: i64) -> Vec<Purchase> {
        self.purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| {
                self.trips.get(&p.trip_id).map(|trip| Purchase {
                    id: p.id,
                    trip: trip.clone(),
                    booked_at: p.booked_at,
                })
            })
            .collect()
    }

    fn to_user(&self, stored: &StoredUser, with_purchases: bool) -> User {
        let purchases = if with_purchases {
            Purchases::Loaded(self.purchases_of(stored.id))
        } else {
            Purchases::NotFetched
        };
        let record = &stored.record;

        User {
            id: stored.id,
            email: record.email.clone(),
            firstname: record.firstname.clone(),
            middle_name: record.middle_name.clone(),
            surname: record.surname.clone(),
            address: record.address.clone(),
            postal_code: record.postal_code.clone(),
            password_hash: record.password_hash.clone(),
            enabled: record.enabled,
            purchases,
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: &UserRecord) -> RepoResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.user_by_email(&user.email).is_some() {
            return Ok(false);
        }

        let id = next_id(&mut tables.last_user_id);
        tables.users.push(StoredUser {
            id,
            record: user.clone(),
        });
        Ok(true)
    }

    async fn find_user(&self, email: &str, with_purchases: bool) -> RepoResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_by_email(email)
            .map(|stored| tables.to_user(stored, with_purchases)))
    }

    async fn list_users(&self, with_purchases: bool) -> RepoResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .map(|stored| tables.to_user(stored, with_purchases))
            .collect())
    }

    async fn delete_user(&self, email: &str) -> RepoResult<Option<u64>> {
        let mut tables = self.tables.write().await;
        let Some(position) = tables.users.iter().position(|u| u.record.email == email) else {
            return Ok(None);
        };

        let user_id = tables.users.remove(position).id;
        let before = tables.purchases.len();
        tables.purchases.retain(|p| p.user_id != user_id);
        let removed = before - tables.purchases.len();

        Ok(Some(removed as u64))
    }
}

#[async_trait]
impl TripRepository for InMemoryStore {
    async fn insert_trip(&self, trip: &NewTrip) -> RepoResult<i64> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_trip_id);
        tables.trips.insert(id, Trip::from_new(id, trip.clone()));
        Ok(id)
    }

    async fn find_trip(&self, id: i64) -> RepoResult<Option<Trip>> {
        let tables = self.tables.read().await;
        Ok(tables.trips.get(&id).cloned())
    }

    async fn top_trips_by_bookings(&self, limit: u32) -> RepoResult<Vec<Trip>> {
        let tables = self.tables.read().await;

        let mut bookings: HashMap<i64, usize> = HashMap::new();
        for purchase in &tables.purchases {
            *bookings.entry(purchase.trip_id).or_default() += 1;
        }
        let count = |trip: &Trip| bookings.get(&trip.id).copied().unwrap_or(0);

        let mut trips: Vec<Trip> = tables.trips.values().cloned().collect();
        trips.sort_by(|a, b| count(b).cmp(&count(a)).then(a.id.cmp(&b.id)));
        trips.truncate(limit as usize);
        Ok(trips)
    }

    async fn trips_at_location_by_cost(&self, location: &str) -> RepoResult<Vec<Trip>> {
        let tables = self.tables.read().await;
        let mut trips: Vec<Trip> = tables
            .trips
            .values()
            .filter(|trip| trip.location == location)
            .cloned()
            .collect();
        trips.sort_by_key(|trip| (trip.cost, trip.id));
        Ok(trips)
    }
}

#[async_trait]
impl PurchaseRepository for InMemoryStore {
    async fn create_purchase(
        &self,
        email: &str,
        trip_id: i64,
    ) -> RepoResult<Result<i64, MissingReference>> {
        let mut tables = self.tables.write().await;

        let Some(user_id) = tables.user_by_email(email).map(|u| u.id) else {
            return Ok(Err(MissingReference::User(email.to_string())));
        };
        if !tables.trips.contains_key(&trip_id) {
            return Ok(Err(MissingReference::Trip(trip_id)));
        }

        let id = next_id(&mut tables.last_purchase_id);
        tables.purchases.push(StoredPurchase {
            id,
            user_id,
            trip_id,
            booked_at: Utc::now(),
        });
        Ok(Ok(id))
    }
}
