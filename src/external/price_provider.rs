use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PriceSource;

/// Latest price for a symbol, with the exchange it trades on when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub exchange: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExternalTickerMatch {
    pub ticker: String,
    pub name: String,
    pub exchange: String,
}

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("no price available for {0}")]
    NotFound(String),

    #[error("unsupported price source: {0}")]
    Unsupported(String),
}

impl From<reqwest::Error> for PriceProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PriceProviderError::Network(format!("timed out: {}", e))
        } else if e.is_decode() {
            PriceProviderError::Parse(e.to_string())
        } else {
            PriceProviderError::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    async fn fetch_quote(&self, source: PriceSource<'_>) -> Result<Quote, PriceProviderError>;

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError>;
}

/// Shared HTTP client for providers. Every request is bounded by `timeout` so
/// a stalled provider can't hold up a refresh cycle.
pub fn http_client(timeout: std::time::Duration) -> Result<reqwest::Client, PriceProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        )
        .build()
        .map_err(|e| PriceProviderError::Network(format!("failed to build HTTP client: {}", e)))
}
