use axum::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::services::auth_service::AdminClaims;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/auth-status", get(auth_status))
}

/// Admin guard: a valid `Authorization: Bearer <token>` header, or 403.
#[async_trait]
impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Forbidden)?;

        state.auth.verify_token(token)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<Value>, AppError> {
    info!("POST /api/login - Admin login");
    let token = state.auth.login(&body.password)?;
    Ok(Json(json!({ "success": true, "token": token })))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<Value> {
    info!("POST /api/logout - Admin logout");
    Json(json!({ "success": true }))
}

pub async fn auth_status(admin: Option<AdminClaims>) -> Json<Value> {
    Json(json!({ "is_admin": admin.is_some() }))
}
