use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{auth, health, jobs, predictions, prices, settings, stats, tickers};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/predictions", predictions::router())
        .nest("/api/settings", settings::router())
        .nest("/api/prices", prices::router())
        .merge(stats::router())
        .merge(jobs::router())
        .merge(tickers::router())
        .merge(auth::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
