use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::models::RefreshSummary;
use crate::services::auth_service::AdminClaims;
use crate::services::job_scheduler_service::{execute_job_with_tracking, refresh_prices, send_report};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/refresh", post(trigger_refresh))
        .route("/api/refresh/status", get(refresh_status))
        .route("/api/send-report", post(trigger_report))
}

/// Starts a refresh in the background and returns immediately.
pub async fn trigger_refresh(_admin: AdminClaims, State(state): State<AppState>) -> Json<Value> {
    info!("POST /api/refresh - Manual price refresh");
    let ctx = state.job_context();
    tokio::spawn(async move {
        execute_job_with_tracking("manual_refresh", || refresh_prices(ctx)).await;
    });
    Json(json!({ "success": true, "message": "가격 업데이트를 시작했습니다" }))
}

pub async fn refresh_status(State(state): State<AppState>) -> Json<RefreshSummary> {
    info!("GET /api/refresh/status - Last refresh summary");
    Json(state.last_refresh.lock().clone())
}

pub async fn trigger_report(_admin: AdminClaims, State(state): State<AppState>) -> Json<Value> {
    info!("POST /api/send-report - Manual dashboard report");
    let ctx = state.job_context();
    tokio::spawn(async move {
        execute_job_with_tracking("manual_report", || send_report(ctx)).await;
    });
    Json(json!({ "success": true }))
}
