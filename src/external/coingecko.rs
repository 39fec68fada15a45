use std::collections::HashMap;

use async_trait::async_trait;

use crate::external::price_provider::{ExternalTickerMatch, PriceProvider, PriceProviderError, Quote};
use crate::models::PriceSource;

const SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Spot prices in USD from CoinGecko's public API. No API key needed.
pub struct CoinGeckoProvider {
    client: reqwest::Client,
}

impl CoinGeckoProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

fn usd_price(coin_id: &str, body: &SimplePriceResponse) -> Result<f64, PriceProviderError> {
    body.get(coin_id)
        .and_then(|prices| prices.get("usd"))
        .copied()
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| PriceProviderError::NotFound(coin_id.to_string()))
}

#[async_trait]
impl PriceProvider for CoinGeckoProvider {
    async fn fetch_quote(&self, source: PriceSource<'_>) -> Result<Quote, PriceProviderError> {
        let PriceSource::CoinGecko(coin_id) = source else {
            return Err(PriceProviderError::Unsupported(format!("{:?}", source)));
        };

        let resp = self
            .client
            .get(SIMPLE_PRICE_URL)
            .query(&[("ids", coin_id), ("vs_currencies", "usd")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!("CoinGecko returned {}", resp.status())));
        }

        let body = resp.json::<SimplePriceResponse>().await?;
        Ok(Quote {
            price: usd_price(coin_id, &body)?,
            exchange: None,
        })
    }

    async fn search_ticker_by_keyword(
        &self,
        _keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        Ok(Vec::new())
    }
}
