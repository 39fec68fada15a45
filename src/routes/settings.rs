use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services;
use crate::services::auth_service::AdminClaims;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).post(update_settings))
}

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<BTreeMap<String, String>>, AppError> {
    info!("GET /api/settings - Reading settings");
    Ok(Json(services::settings_service::get_all(&state.pool).await?))
}

/// Saves settings and, when the refresh interval was part of the update,
/// re-arms the periodic job with the stored value.
pub async fn update_settings(
    _admin: AdminClaims,
    State(state): State<AppState>,
    Json(updates): Json<BTreeMap<String, Value>>,
) -> Result<Json<Value>, AppError> {
    info!("POST /api/settings - Updating {} setting(s)", updates.len());
    let interval_changed = services::settings_service::update(&state.pool, updates).await?;

    if interval_changed {
        let minutes = services::settings_service::get_interval(&state.pool).await?;
        state.scheduler.reset(minutes).await.map_err(|e| {
            error!("Failed to re-arm scheduler: {}", e);
            e
        })?;
    }

    Ok(Json(json!({ "success": true })))
}
