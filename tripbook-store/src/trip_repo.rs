use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tripbook_core::repository::{RepoResult, TripRepository};
use tripbook_core::trip::{NewTrip, Trip};

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: i64,
    origin: String,
    destination: String,
    cost: i32,
    location: String,
    departure_date: NaiveDate,
    return_date: NaiveDate,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            cost: row.cost,
            location: row.location,
            departure_date: row.departure_date,
            return_date: row.return_date,
        }
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn insert_trip(&self, trip: &NewTrip) -> RepoResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO trips (origin, destination, cost, location, departure_date, return_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.cost)
        .bind(&trip.location)
        .bind(trip.departure_date)
        .bind(trip.return_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_trip(&self, id: i64) -> RepoResult<Option<Trip>> {
        let row = sqlx::query_as::<_, TripRow>(
            "SELECT id, origin, destination, cost, location, departure_date, return_date FROM trips WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Trip::from))
    }

    async fn top_trips_by_bookings(&self, limit: u32) -> RepoResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT t.id, t.origin, t.destination, t.cost, t.location, t.departure_date, t.return_date
            FROM trips t
            LEFT JOIN purchases p ON p.trip_id = t.id
            GROUP BY t.id
            ORDER BY COUNT(p.id) DESC, t.id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }

    async fn trips_at_location_by_cost(&self, location: &str) -> RepoResult<Vec<Trip>> {
        let rows = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, origin, destination, cost, location, departure_date, return_date
            FROM trips
            WHERE location = $1
            ORDER BY cost ASC, id ASC
            "#,
        )
        .bind(location)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Trip::from).collect())
    }
}
