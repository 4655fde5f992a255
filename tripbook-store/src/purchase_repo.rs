use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres};
use std::collections::HashMap;
use tripbook_core::purchase::{MissingReference, Purchase};
use tripbook_core::repository::{PurchaseRepository, RepoResult};
use tripbook_core::trip::Trip;

pub struct PgPurchaseRepository {
    pool: PgPool,
}

impl PgPurchaseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    purchase_id: i64,
    user_id: i64,
    booked_at: DateTime<Utc>,
    trip_id: i64,
    origin: String,
    destination: String,
    cost: i32,
    location: String,
    departure_date: NaiveDate,
    return_date: NaiveDate,
}

/// Purchases of the given users keyed by user id, each list in booking order.
pub(crate) async fn load_purchases<'e, E>(
    executor: E,
    user_ids: &[i64],
) -> Result<HashMap<i64, Vec<Purchase>>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, PurchaseRow>(
        r#"
        SELECT p.id AS purchase_id, p.user_id, p.booked_at,
               t.id AS trip_id, t.origin, t.destination, t.cost, t.location, t.departure_date, t.return_date
        FROM purchases p
        JOIN trips t ON t.id = p.trip_id
        WHERE p.user_id = ANY($1)
        ORDER BY p.id ASC
        "#,
    )
    .bind(user_ids)
    .fetch_all(executor)
    .await?;

    let mut by_user: HashMap<i64, Vec<Purchase>> = HashMap::new();
    for row in rows {
        by_user.entry(row.user_id).or_default().push(Purchase {
            id: row.purchase_id,
            booked_at: row.booked_at,
            trip: Trip {
                id: row.trip_id,
                origin: row.origin,
                destination: row.destination,
                cost: row.cost,
                location: row.location,
                departure_date: row.departure_date,
                return_date: row.return_date,
            },
        });
    }

    Ok(by_user)
}

#[async_trait]
impl PurchaseRepository for PgPurchaseRepository {
    async fn create_purchase(
        &self,
        email: &str,
        trip_id: i64,
    ) -> RepoResult<Result<i64, MissingReference>> {
        let mut tx = self.pool.begin().await?;

        // Share locks keep both rows alive until the purchase is committed.
        let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1 FOR SHARE")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(user_id) = user_id else {
            return Ok(Err(MissingReference::User(email.to_string())));
        };

        let trip_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM trips WHERE id = $1 FOR SHARE")
            .bind(trip_id)
            .fetch_optional(&mut *tx)
            .await?;
        if trip_exists.is_none() {
            return Ok(Err(MissingReference::Trip(trip_id)));
        }

        let purchase_id: i64 = sqlx::query_scalar(
            "INSERT INTO purchases (user_id, trip_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id)
        .bind(trip_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Ok(purchase_id))
    }
}
