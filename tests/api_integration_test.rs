/// API Integration Tests
///
/// Drives the full axum router against an in-memory SQLite database:
/// - Admin login and the bearer-token guard
/// - Prediction CRUD and grading
/// - Daily index / asset stats read models
/// - Settings validation and scheduler re-arming
/// - Ticker search and validation through a fake price provider
use std::collections::HashMap;
use std::sync::Arc;

use algamja_backend::app::create_app;
use algamja_backend::config::Config;
use algamja_backend::db;
use algamja_backend::external::price_provider::{ExternalTickerMatch, PriceProvider, PriceProviderError, Quote};
use algamja_backend::models::PriceSource;
use algamja_backend::state::AppState;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct StaticPrices(HashMap<&'static str, f64>);

#[async_trait]
impl PriceProvider for StaticPrices {
    async fn fetch_quote(&self, source: PriceSource<'_>) -> Result<Quote, PriceProviderError> {
        let symbol = match source {
            PriceSource::Yahoo(s) | PriceSource::CoinGecko(s) => s,
        };
        self.0
            .get(symbol)
            .map(|price| Quote { price: *price, exchange: Some("NMS".into()) })
            .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))
    }

    async fn search_ticker_by_keyword(&self, _: &str) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        Ok(vec![ExternalTickerMatch {
            ticker: "AAPL".into(),
            name: "Apple Inc.".into(),
            exchange: "NASDAQ".into(),
        }])
    }
}

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let pool = db::connect_in_memory().await.unwrap();
        let provider: Arc<dyn PriceProvider> = Arc::new(StaticPrices(HashMap::from([("AAPL", 189.987)])));
        let state = AppState::new(pool, Config::in_memory(), provider, None).await.unwrap();
        Self { router: create_app(state.clone()), state }
    }

    async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()));
        (status, value)
    }

    async fn login(&self) -> String {
        let (status, body) = self
            .call("POST", "/api/login", None, Some(json!({ "password": "test-password" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn add(&self, token: &str, asset: &str, date: &str, direction: &str) -> i64 {
        let (status, body) = self
            .call(
                "POST",
                "/api/predictions",
                Some(token),
                Some(json!({
                    "asset_market": asset,
                    "mention_date": date,
                    "mention_price": 100,
                    "direction": direction,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["prediction"]["id"].as_i64().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test(flavor = "multi_thread")]
async fn wrong_password_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app.call("POST", "/api/login", None, Some(json!({ "password": "nope" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn auth_status_reflects_token() {
    let app = TestApp::new().await;
    let (_, anonymous) = app.call("GET", "/api/auth-status", None, None).await;
    assert_eq!(anonymous["is_admin"], json!(false));

    let token = app.login().await;
    let (_, admin) = app.call("GET", "/api/auth-status", Some(&token), None).await;
    assert_eq!(admin["is_admin"], json!(true));

    let (_, forged) = app.call("GET", "/api/auth-status", Some("forged"), None).await;
    assert_eq!(forged["is_admin"], json!(false));
}

#[tokio::test(flavor = "multi_thread")]
async fn mutations_require_admin_token() {
    let app = TestApp::new().await;
    let body = json!({ "asset_market": "KOSPI", "mention_date": "2024-01-10", "mention_price": 1, "direction": "UP" });

    let (status, _) = app.call("POST", "/api/predictions", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("POST", "/api/predictions", Some("garbage"), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", "/api/predictions/1", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("POST", "/api/refresh", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listing) = app.call("GET", "/api/predictions", None, None).await;
    assert_eq!(listing["predictions"], json!([]));
}

// ---------------------------------------------------------------------------
// Predictions and the index
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn grading_updates_index_series_and_stats() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let kospi = app.add(&token, "KOSPI", "2024-01-10", "UP").await;
    app.add(&token, "금", "2024-01-12", "DOWN").await;

    let (_, series) = app.call("GET", "/api/daily-index", None, None).await;
    assert_eq!(series, json!([]));

    let (status, graded) = app
        .call(
            "POST",
            &format!("/api/predictions/{}/result", kospi),
            Some(&token),
            Some(json!({ "hit": 3, "miss": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["prediction"]["hit"], json!(3));

    let (_, listing) = app.call("GET", "/api/predictions", None, None).await;
    assert_eq!(listing["algamja_index"], json!(75.0));
    assert_eq!(listing["total_hit"], json!(3));
    assert_eq!(listing["predictions"][0]["asset_market"], json!("금"));

    let (_, series) = app.call("GET", "/api/daily-index", None, None).await;
    assert_eq!(series.as_array().unwrap().len(), 1);
    assert_eq!(series[0]["algamja_index"], json!(75.0));

    let (_, stats) = app.call("GET", "/api/asset-stats", None, None).await;
    assert_eq!(
        stats,
        json!([
            { "asset_market": "KOSPI", "total_hit": 3, "total_miss": 1, "total_count": 1 },
            { "asset_market": "금", "total_hit": 0, "total_miss": 0, "total_count": 1 },
        ])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn negative_counts_are_clamped() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.add(&token, "NASDAQ", "2024-01-10", "UP").await;

    let (status, body) = app
        .call("POST", &format!("/api/predictions/{}/result", id), Some(&token), Some(json!({ "hit": -5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["hit"], json!(0));
}

#[tokio::test(flavor = "multi_thread")]
async fn counters_are_coerced_from_strings_and_floats() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.add(&token, "NASDAQ", "2024-01-10", "UP").await;
    let uri = format!("/api/predictions/{}/result", id);

    let (status, body) = app.call("POST", &uri, Some(&token), Some(json!({ "hit": "3", "miss": 2.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["hit"], json!(3));
    assert_eq!(body["prediction"]["miss"], json!(2));

    let (status, body) = app.call("POST", &uri, Some(&token), Some(json!({ "hit": "many" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("hit"));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_input_is_a_bad_request() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/predictions",
            Some(&token),
            Some(json!({ "asset_market": "KOSPI", "mention_price": 1, "direction": "UP" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("mention_date"));

    let (status, _) = app
        .call(
            "POST",
            "/api/predictions",
            Some(&token),
            Some(json!({ "asset_market": "KOSPI", "mention_date": "2024-01-10", "mention_price": 1, "direction": "SIDEWAYS" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn update_and_delete_round_trip() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let id = app.add(&token, "KOSPI", "2024-01-10", "UP").await;

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/predictions/{}", id),
            Some(&token),
            Some(json!({
                "asset_market": "삼성전자",
                "ticker": "005930.KS",
                "mention_date": "2024-02-01",
                "mention_price": "71,000",
                "direction": "DOWN",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"]["ticker"], json!("005930.KS"));
    assert_eq!(body["prediction"]["mention_price"], json!(71000.0));

    let (status, _) = app.call("DELETE", &format!("/api/predictions/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.call("DELETE", &format!("/api/predictions/{}", id), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn settings_validate_interval_and_rearm_scheduler() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (_, settings) = app.call("GET", "/api/settings", None, None).await;
    assert_eq!(settings["update_interval"], json!("5"));

    let (status, _) = app
        .call("POST", "/api/settings", Some(&token), Some(json!({ "update_interval": 0 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.state.scheduler.active_job().await, None);

    let (status, _) = app
        .call("POST", "/api/settings", Some(&token), Some(json!({ "update_interval": "10" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.scheduler.active_job().await.is_some());

    let (_, settings) = app.call("GET", "/api/settings", None, None).await;
    assert_eq!(settings["update_interval"], json!("10"));
}

// ---------------------------------------------------------------------------
// Tickers and prices
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn ticker_search_and_validation() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let (status, results) = app.call("GET", "/api/search-ticker-name?q=naver&suffix=.KS", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["ticker"], json!("035420.KS"));

    let (_, results) = app.call("GET", "/api/search-ticker-name?q=apple", None, None).await;
    assert_eq!(results[0]["ticker"], json!("AAPL"));

    let (_, empty) = app.call("GET", "/api/search-ticker-name", None, None).await;
    assert_eq!(empty, json!([]));

    let (status, check) = app
        .call("POST", "/api/validate-ticker", Some(&token), Some(json!({ "ticker": "aapl" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check, json!({ "valid": true, "price": 189.99, "exchange": "NMS" }));

    let (_, check) = app
        .call("POST", "/api/validate-ticker", Some(&token), Some(json!({ "ticker": "ZZZZ" })))
        .await;
    assert_eq!(check, json!({ "valid": false }));
}

#[tokio::test(flavor = "multi_thread")]
async fn prices_and_refresh_status_start_empty() {
    let app = TestApp::new().await;

    let (status, prices) = app.call("GET", "/api/prices", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prices, json!([]));

    let (status, summary) = app.call("GET", "/api/refresh/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["refreshed"], json!([]));
    assert_eq!(summary["finished_at"], Value::Null);
}
