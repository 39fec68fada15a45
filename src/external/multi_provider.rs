use async_trait::async_trait;
use tracing::{info, warn};

use crate::external::price_provider::{ExternalTickerMatch, PriceProvider, PriceProviderError, Quote};
use crate::models::PriceSource;

/// Routes each quote to the provider that owns its source.
///
/// Strategy:
/// 1. Yahoo symbols go straight to Yahoo Finance
/// 2. CoinGecko ids go to CoinGecko
/// 3. If CoinGecko fails and the coin has a Yahoo pair (e.g. `BTC-USD`), try Yahoo
///
/// Ticker search is Yahoo-only.
pub struct AssetPriceRouter {
    yahoo: Box<dyn PriceProvider>,
    coingecko: Box<dyn PriceProvider>,
}

impl AssetPriceRouter {
    pub fn new(yahoo: Box<dyn PriceProvider>, coingecko: Box<dyn PriceProvider>) -> Self {
        Self { yahoo, coingecko }
    }

    /// Yahoo pair used when CoinGecko can't price a coin.
    fn yahoo_pair_for_coin(coin_id: &str) -> Option<&'static str> {
        match coin_id {
            "bitcoin" => Some("BTC-USD"),
            "ethereum" => Some("ETH-USD"),
            _ => None,
        }
    }
}

#[async_trait]
impl PriceProvider for AssetPriceRouter {
    async fn fetch_quote(&self, source: PriceSource<'_>) -> Result<Quote, PriceProviderError> {
        let coin_id = match source {
            PriceSource::Yahoo(_) => return self.yahoo.fetch_quote(source).await,
            PriceSource::CoinGecko(coin_id) => coin_id,
        };

        let primary_err = match self.coingecko.fetch_quote(source).await {
            Ok(quote) => return Ok(quote),
            Err(e) => e,
        };

        let Some(pair) = Self::yahoo_pair_for_coin(coin_id) else {
            return Err(primary_err);
        };

        warn!("CoinGecko failed for {}: {}. Falling back to Yahoo {}", coin_id, primary_err, pair);
        match self.yahoo.fetch_quote(PriceSource::Yahoo(pair)).await {
            Ok(quote) => {
                info!("✓ Priced {} via Yahoo fallback {}", coin_id, pair);
                Ok(quote)
            }
            Err(e) => Err(PriceProviderError::BadResponse(format!(
                "Failed to price {} from CoinGecko ({}) and Yahoo ({})",
                coin_id, primary_err, e
            ))),
        }
    }

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        self.yahoo.search_ticker_by_keyword(keyword).await
    }
}
