use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BookTripRequest {
    pub email: String,
    pub trip_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub purchase_id: i64,
    pub trip_id: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/purchases", post(book_trip))
}

/// POST /v1/purchases
/// 404 when either the user or the trip is unknown
async fn book_trip(
    State(state): State<AppState>,
    AppJson(req): AppJson<BookTripRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let purchase_id = state.purchases.book_trip(&req.email, req.trip_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(PurchaseResponse {
            purchase_id,
            trip_id: req.trip_id,
        }),
    ))
}
