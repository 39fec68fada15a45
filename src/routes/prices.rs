use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::PriceSnapshot;
use crate::services;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_prices))
}

pub async fn list_prices(State(state): State<AppState>) -> Result<Json<Vec<PriceSnapshot>>, AppError> {
    info!("GET /api/prices - Latest prices");
    Ok(Json(services::price_service::get_all(&state.pool).await?))
}
