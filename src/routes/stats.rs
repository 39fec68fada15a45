use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{AssetStats, DailyIndexPoint};
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/daily-index", get(daily_index))
        .route("/api/asset-stats", get(asset_stats))
}

pub async fn daily_index(State(state): State<AppState>) -> Result<Json<Vec<DailyIndexPoint>>, AppError> {
    info!("GET /api/daily-index - Listing daily index series");
    Ok(Json(services::index_engine::daily_series(&state.pool).await?))
}

pub async fn asset_stats(State(state): State<AppState>) -> Result<Json<Vec<AssetStats>>, AppError> {
    info!("GET /api/asset-stats - Per-asset accuracy");
    Ok(Json(services::prediction_service::asset_stats(&state.pool).await?))
}
