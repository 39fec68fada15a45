use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use url::Url;

use crate::external::price_provider::{ExternalTickerMatch, PriceProvider, PriceProviderError, Quote};
use crate::models::PriceSource;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart/";
const SEARCH_HOSTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/finance/search",
    "https://query2.finance.yahoo.com/v1/finance/search",
];

pub struct YahooProvider {
    client: reqwest::Client,
}

impl YahooProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn search_host(&self, host: &str, keyword: &str) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        let resp = self
            .client
            .get(host)
            .query(&[
                ("q", keyword),
                ("quotesCount", "10"),
                ("newsCount", "0"),
                ("enableFuzzyQuery", "false"),
            ])
            .header("Referer", "https://finance.yahoo.com/")
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(PriceProviderError::BadResponse(format!("search returned {}", resp.status())));
        }

        let body = resp.json::<YahooSearchResponse>().await?;
        Ok(equity_matches(body))
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: Option<YahooMeta>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    exchange_name: Option<String>,
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooSearchResponse {
    #[serde(default)]
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    quote_type: Option<String>,
    longname: Option<String>,
    shortname: Option<String>,
    exch_disp: Option<String>,
}

fn chart_url(symbol: &str) -> Result<Url, PriceProviderError> {
    let mut url = Url::parse(CHART_URL).map_err(|e| PriceProviderError::Parse(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| PriceProviderError::Parse("chart URL cannot be a base".into()))?
        .pop_if_empty()
        .push(symbol);
    url.query_pairs_mut().append_pair("range", "5d").append_pair("interval", "1d");
    Ok(url)
}

/// Latest non-empty daily close, falling back to the live market price.
fn quote_from_chart(symbol: &str, body: YahooChartResponse) -> Result<Quote, PriceProviderError> {
    if let Some(err) = body.chart.error.filter(|e| !e.is_null()) {
        return Err(PriceProviderError::BadResponse(format!("{}: {}", symbol, err)));
    }

    let result = body
        .chart
        .result
        .and_then(|mut r| r.pop())
        .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))?;

    let last_close = result
        .indicators
        .quote
        .first()
        .and_then(|q| q.close.iter().rev().find_map(|c| *c));

    let (exchange, market_price) = match result.meta {
        Some(meta) => (meta.exchange_name, meta.regular_market_price),
        None => (None, None),
    };

    let price = last_close
        .or(market_price)
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))?;

    Ok(Quote { price, exchange })
}

fn equity_matches(body: YahooSearchResponse) -> Vec<ExternalTickerMatch> {
    body.quotes
        .into_iter()
        .filter(|q| q.quote_type.as_deref() == Some("EQUITY"))
        .filter_map(|q| {
            let symbol = q.symbol?;
            let name = q.longname.or(q.shortname).unwrap_or_else(|| symbol.clone());
            Some(ExternalTickerMatch {
                ticker: symbol,
                name,
                exchange: q.exch_disp.unwrap_or_default(),
            })
        })
        .collect()
}

#[async_trait]
impl PriceProvider for YahooProvider {
    async fn fetch_quote(&self, source: PriceSource<'_>) -> Result<Quote, PriceProviderError> {
        let PriceSource::Yahoo(symbol) = source else {
            return Err(PriceProviderError::Unsupported(format!("{:?}", source)));
        };

        let resp = self.client.get(chart_url(symbol)?).send().await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PriceProviderError::NotFound(symbol.to_string()));
        }

        let body = resp
            .json::<YahooChartResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        quote_from_chart(symbol, body)
    }

    async fn search_ticker_by_keyword(
        &self,
        keyword: &str,
    ) -> Result<Vec<ExternalTickerMatch>, PriceProviderError> {
        let mut last_err = PriceProviderError::BadResponse("no search host answered".into());
        for host in SEARCH_HOSTS {
            match self.search_host(host, keyword).await {
                Ok(matches) => return Ok(matches),
                Err(e) => {
                    warn!("Yahoo search via {} failed for '{}': {}", host, keyword, e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}
