use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rate limited by external provider")]
    RateLimited,
    #[error("External error: {0}")]
    External(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Admin privileges required")]
    Forbidden,
    #[error("Internal error: {0}")]
    Internal(String),
}

fn error_body(msg: impl Into<String>) -> Json<serde_json::Value> {
    Json(json!({ "error": msg.into() }))
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, error_body(msg)).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, error_body(msg)).into_response(),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, error_body("Invalid password")).into_response()
            }
            AppError::Forbidden => {
                (StatusCode::FORBIDDEN, error_body("Admin privileges required")).into_response()
            }
            AppError::RateLimited => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("60"));
                (StatusCode::TOO_MANY_REQUESTS, headers, error_body("Rate limited")).into_response()
            }
            AppError::External(msg) => (StatusCode::BAD_GATEWAY, error_body(msg)).into_response(),
            AppError::Db(e) => {
                error!("Database error surfaced to client: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal server error")).into_response()
            }
            AppError::Internal(msg) => {
                error!("Internal error surfaced to client: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal server error")).into_response()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

impl From<String> for AppError {
    fn from(value: String) -> Self {
        AppError::Validation(value)
    }
}
