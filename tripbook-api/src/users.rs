use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tripbook_core::{CoreError, NewUser, User};

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    #[serde(default)]
    pub with_purchases: bool,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserDeletedResponse {
    pub email: String,
    pub purchases_removed: u64,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(create_user).get(list_users))
        .route("/v1/users/{email}", get(get_user).delete(delete_user))
        .route("/v1/sessions", post(check_credentials))
}

/// POST /v1/users
async fn create_user(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewUser>,
) -> Result<(StatusCode, Json<UserCreatedResponse>), AppError> {
    let email = req.email.clone();

    if !state.users.create_user(req).await? {
        return Err(CoreError::Duplicate { email }.into());
    }

    Ok((StatusCode::CREATED, Json(UserCreatedResponse { email })))
}

/// GET /v1/users
async fn list_users(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<FetchParams>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = state.users.get_all_users(params.with_purchases).await?;
    Ok(Json(users))
}

/// GET /v1/users/:email
async fn get_user(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
    AppQuery(params): AppQuery<FetchParams>,
) -> Result<Json<User>, AppError> {
    let user = state.users.get_user(&email, params.with_purchases).await?;
    Ok(Json(user))
}

/// DELETE /v1/users/:email
/// Removes the user and every purchase it owns
async fn delete_user(
    State(state): State<AppState>,
    AppPath(email): AppPath<String>,
) -> Result<Json<UserDeletedResponse>, AppError> {
    let purchases_removed = state.users.delete_user(&email).await?;
    Ok(Json(UserDeletedResponse { email, purchases_removed }))
}

/// POST /v1/sessions
async fn check_credentials(
    State(state): State<AppState>,
    AppJson(req): AppJson<Credentials>,
) -> Result<StatusCode, AppError> {
    if state.users.authenticate(&req.email, &req.password).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::AuthenticationError("Invalid email or password".to_string()))
    }
}
