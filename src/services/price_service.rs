use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::Utc;
use futures::future::join_all;
use regex::Regex;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::{ExternalTickerMatch, PriceProvider, PriceProviderError};
use crate::models::{AssetId, PriceSnapshot, PriceSource, RefreshSummary, TrackedAsset};
use crate::services::index_engine::{self, round_to};
use crate::services::ticker_directory;

pub async fn get_all(pool: &SqlitePool) -> Result<Vec<PriceSnapshot>, AppError> {
    db::price_queries::fetch_all(pool).await.map_err(|e| {
        error!("Failed to fetch latest prices: {}", e);
        AppError::Db(e)
    })
}

/// Everything the refresh cycle prices: the tracked markets followed by every
/// individual security the ledger mentions, one entry per display name.
async fn assets_to_refresh(pool: &SqlitePool) -> Result<Vec<AssetId>, AppError> {
    let custom = db::prediction_queries::fetch_custom_assets(pool).await?;

    let mut seen = HashSet::new();
    let assets = TrackedAsset::ALL
        .into_iter()
        .map(AssetId::Tracked)
        .chain(
            custom
                .into_iter()
                .map(|row| AssetId::resolve(&row.asset_market, row.ticker.as_deref())),
        )
        .filter(|asset| seen.insert(asset.display_name().to_string()))
        .collect();
    Ok(assets)
}

/// One refresh pass. Every asset is fetched concurrently; an asset whose fetch
/// fails keeps its previous price. Today's index is re-snapshotted afterwards.
pub async fn refresh_all_prices(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
) -> Result<RefreshSummary, AppError> {
    let mut summary = RefreshSummary {
        started_at: Some(Utc::now()),
        ..Default::default()
    };

    let assets = assets_to_refresh(pool).await?;
    info!("🔄 Refreshing prices for {} assets", assets.len());

    let fetches = assets.iter().map(|asset| async move {
        let result = provider.fetch_quote(asset.price_source()).await;
        (asset, result)
    });

    for (asset, result) in join_all(fetches).await {
        let name = asset.display_name();
        let quote = match result {
            Ok(quote) => quote,
            Err(e) => {
                warn!("Price fetch failed for {} ({:?}): {}", name, asset.price_source(), e);
                summary.failed.push(name.to_string());
                continue;
            }
        };

        let price = round_to(quote.price, 2);
        match db::price_queries::upsert_latest(pool, name, price, Utc::now()).await {
            Ok(()) => {
                info!("  {}: {:.2}", name, price);
                summary.refreshed.push(name.to_string());
            }
            Err(e) => {
                error!("Failed to store price for {}: {}", name, e);
                summary.failed.push(name.to_string());
            }
        }
    }

    index_engine::record_snapshot(pool, index_engine::today()).await?;

    summary.finished_at = Some(Utc::now());
    info!(
        "✅ Price refresh finished: {} updated, {} failed",
        summary.refreshed.len(),
        summary.failed.len()
    );
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
}

impl TickerValidation {
    fn invalid() -> Self {
        Self { valid: false, price: None, exchange: None }
    }
}

fn ticker_pattern() -> Result<&'static Regex, AppError> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z0-9^][A-Z0-9.\-=^]{0,19}$"))
        .as_ref()
        .map_err(|e| AppError::Internal(format!("ticker pattern: {}", e)))
}

/// Checks that `ticker` is quotable. The ticker is upper-cased first; malformed
/// symbols are reported invalid without calling the provider.
pub async fn validate_ticker(provider: &dyn PriceProvider, ticker: &str) -> Result<TickerValidation, AppError> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AppError::Validation("ticker is required".to_string()));
    }
    if !ticker_pattern()?.is_match(&ticker) {
        return Ok(TickerValidation::invalid());
    }

    match provider.fetch_quote(PriceSource::Yahoo(&ticker)).await {
        Ok(quote) => Ok(TickerValidation {
            valid: true,
            price: Some(round_to(quote.price, 2)),
            exchange: Some(quote.exchange.unwrap_or_else(|| ticker.clone())),
        }),
        Err(PriceProviderError::RateLimited) => Err(AppError::RateLimited),
        Err(e) => {
            info!("Ticker {} did not validate: {}", ticker, e);
            Ok(TickerValidation::invalid())
        }
    }
}

/// Name search. Korean markets (`.KS` / `.KQ`) use the local directory and then
/// try the query as a listing code; everything else goes to the provider.
pub async fn search_ticker_by_name(
    provider: &dyn PriceProvider,
    query: &str,
    suffix: &str,
) -> Result<Vec<ExternalTickerMatch>, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    if suffix == ".KS" || suffix == ".KQ" {
        let local = ticker_directory::search_korean_stock(query, suffix);
        if !local.is_empty() {
            return Ok(local);
        }

        let mut candidate = query.to_uppercase();
        if !candidate.ends_with(suffix) {
            candidate.push_str(suffix);
        }
        let check = validate_ticker(provider, &candidate).await?;
        if !check.valid {
            return Ok(Vec::new());
        }
        return Ok(vec![ExternalTickerMatch {
            name: candidate.clone(),
            ticker: candidate,
            exchange: suffix.trim_start_matches('.').to_string(),
        }]);
    }

    match provider.search_ticker_by_keyword(query).await {
        Ok(matches) => Ok(matches
            .into_iter()
            .filter(|m| suffix.is_empty() || m.ticker.ends_with(suffix))
            .collect()),
        Err(PriceProviderError::RateLimited) => Err(AppError::RateLimited),
        Err(e) => {
            warn!("Ticker search failed for '{}': {}", query, e);
            Ok(Vec::new())
        }
    }
}
