use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tripbook_core::{NewTrip, Trip};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TopTripsParams {
    /// Falls back to `catalog.top_trips` when absent.
    pub n: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct TripCreatedResponse {
    pub id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips", post(create_trip).get(trips_by_location))
        .route("/v1/trips/top", get(top_trips))
        .route("/v1/trips/{id}", get(get_trip))
}

/// POST /v1/trips
async fn create_trip(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewTrip>,
) -> Result<(StatusCode, Json<TripCreatedResponse>), AppError> {
    let id = state.trips.create_trip(req).await?;
    Ok((StatusCode::CREATED, Json(TripCreatedResponse { id })))
}

/// GET /v1/trips/top?n=5
async fn top_trips(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TopTripsParams>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let n = params.n.unwrap_or(state.catalog.top_trips);
    Ok(Json(state.trips.get_top_n_trips(n).await?))
}

/// GET /v1/trips?location=Bahamas
/// Cheapest first
async fn trips_by_location(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<LocationParams>,
) -> Result<Json<Vec<Trip>>, AppError> {
    debug!(location = %params.location, "Retrieving trips by location");
    let trips = state
        .trips
        .get_by_location_order_by_cost_ascending(&params.location)
        .await?;
    Ok(Json(trips))
}

/// GET /v1/trips/:id
async fn get_trip(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.trips.get_trip(id).await?))
}
