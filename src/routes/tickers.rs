use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::external::price_provider::ExternalTickerMatch;
use crate::services::auth_service::AdminClaims;
use crate::services::price_service::{self, TickerValidation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/search-ticker-name", get(search_ticker_name))
        .route("/api/validate-ticker", post(validate_ticker))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub suffix: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub ticker: String,
}

pub async fn search_ticker_name(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ExternalTickerMatch>>, AppError> {
    info!("GET /api/search-ticker-name - q='{}' suffix='{}'", query.q, query.suffix);
    let matches = price_service::search_ticker_by_name(state.price_provider.as_ref(), &query.q, &query.suffix).await?;
    Ok(Json(matches))
}

pub async fn validate_ticker(
    _admin: AdminClaims,
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<TickerValidation>, AppError> {
    info!("POST /api/validate-ticker - {}", body.ticker);
    let result = price_service::validate_ticker(state.price_provider.as_ref(), &body.ticker).await?;
    Ok(Json(result))
}
