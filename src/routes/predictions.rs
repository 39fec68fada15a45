use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{PredictionInput, PredictionListing, SetResultInput};
use crate::services;
use crate::services::auth_service::AdminClaims;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_predictions).post(create_prediction))
        .route("/:id", put(update_prediction).delete(delete_prediction))
        .route("/:id/result", post(set_result))
}

pub async fn list_predictions(State(state): State<AppState>) -> Result<Json<PredictionListing>, AppError> {
    info!("GET /api/predictions - Listing predictions");
    let listing = services::prediction_service::list(&state.pool).await?;
    Ok(Json(listing))
}

pub async fn create_prediction(
    _admin: AdminClaims,
    State(state): State<AppState>,
    Json(input): Json<PredictionInput>,
) -> Result<Json<Value>, AppError> {
    info!("POST /api/predictions - Adding prediction");
    let prediction = services::prediction_service::create(&state.pool, input)
        .await
        .map_err(|e| {
            error!("Failed to add prediction: {}", e);
            e
        })?;
    Ok(Json(json!({ "success": true, "prediction": prediction })))
}

pub async fn update_prediction(
    _admin: AdminClaims,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(input): Json<PredictionInput>,
) -> Result<Json<Value>, AppError> {
    info!("PUT /api/predictions/{} - Updating prediction", id);
    let prediction = services::prediction_service::update(&state.pool, id, input)
        .await
        .map_err(|e| {
            error!("Failed to update prediction {}: {}", id, e);
            e
        })?;
    Ok(Json(json!({ "success": true, "prediction": prediction })))
}

pub async fn delete_prediction(
    _admin: AdminClaims,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    info!("DELETE /api/predictions/{} - Deleting prediction", id);
    services::prediction_service::delete(&state.pool, id)
        .await
        .map_err(|e| {
            error!("Failed to delete prediction {}: {}", id, e);
            e
        })?;
    Ok(Json(json!({ "success": true })))
}

pub async fn set_result(
    _admin: AdminClaims,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(input): Json<SetResultInput>,
) -> Result<Json<Value>, AppError> {
    info!("POST /api/predictions/{}/result - Grading prediction", id);
    let result = input.validate().map_err(AppError::Validation)?;
    let prediction = services::prediction_service::set_result(&state.pool, id, result).await?;
    Ok(Json(json!({ "success": true, "prediction": prediction })))
}
