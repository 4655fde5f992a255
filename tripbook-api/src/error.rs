use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tripbook_core::{CoreError, Violations};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    BadRequestError(String),
    ValidationError(Violations),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::BadRequestError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::ValidationError(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "Validation failed", "violations": violations }),
            ),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequestError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequestError(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequestError(rejection.body_text())
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(violations) => AppError::ValidationError(violations),
            CoreError::Duplicate { .. } => AppError::ConflictError(err.to_string()),
            CoreError::NotFound { .. } | CoreError::Referential(_) => AppError::NotFoundError(err.to_string()),
            // Reading unfetched purchases is a bug on our side, not the client's.
            CoreError::NotLoaded(_) | CoreError::Storage(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}
