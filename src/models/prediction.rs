use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            other => Err(format!("direction must be UP or DOWN (got '{}')", other)),
        }
    }
}

// A public claim that an asset will move up or down, plus its manual grading.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Prediction {
    pub id: i64,
    pub asset_market: String,
    pub ticker: Option<String>,
    pub mention_date: NaiveDate,
    pub mention_price: f64,
    pub direction: Direction,
    pub hit: i64,
    pub miss: i64,
    pub created_at: DateTime<Utc>,
}

/// A prediction joined with the latest known price of its asset.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PredictionWithPrice {
    pub id: i64,
    pub asset_market: String,
    pub ticker: Option<String>,
    pub mention_date: NaiveDate,
    pub mention_price: f64,
    pub direction: Direction,
    pub hit: i64,
    pub miss: i64,
    pub created_at: DateTime<Utc>,
    pub current_price: Option<f64>,
    pub price_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionListing {
    pub predictions: Vec<PredictionWithPrice>,
    pub total_hit: i64,
    pub total_miss: i64,
    pub algamja_index: f64,
}

/// Raw create/update body. Every field is optional so that a missing field is
/// reported by name instead of as a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionInput {
    pub asset_market: Option<String>,
    pub ticker: Option<String>,
    pub mention_date: Option<String>,
    pub mention_price: Option<serde_json::Value>,
    pub direction: Option<String>,
}

/// Validated fields of a prediction, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrediction {
    pub asset_market: String,
    pub ticker: Option<String>,
    pub mention_date: NaiveDate,
    pub mention_price: f64,
    pub direction: Direction,
}

/// Counter values as they arrive on the wire: numbers or numeric strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetResultInput {
    pub hit: Option<serde_json::Value>,
    pub miss: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetResult {
    pub hit: Option<i64>,
    pub miss: Option<i64>,
}

impl SetResultInput {
    pub fn validate(self) -> Result<SetResult, String> {
        Ok(SetResult {
            hit: self.hit.as_ref().map(|v| parse_count("hit", v)).transpose()?,
            miss: self.miss.as_ref().map(|v| parse_count("miss", v)).transpose()?,
        })
    }
}

/// Integer counter; fractional numbers are truncated toward zero.
fn parse_count(key: &str, value: &serde_json::Value) -> Result<i64, String> {
    let count = match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    count.ok_or_else(|| format!("{} must be an integer (got {})", key, value))
}

impl PredictionInput {
    pub fn validate(self) -> Result<NewPrediction, String> {
        let asset_market = self.asset_market.ok_or("asset_market field is required")?;
        let mention_date = self.mention_date.ok_or("mention_date field is required")?;
        let mention_price = self.mention_price.ok_or("mention_price field is required")?;
        let direction = self.direction.ok_or("direction field is required")?;

        let asset_market = asset_market.trim().to_string();
        if asset_market.is_empty() {
            return Err("Select an asset market or enter a ticker".to_string());
        }

        let direction = direction.parse::<Direction>()?;

        let mention_date = NaiveDate::parse_from_str(mention_date.trim(), "%Y-%m-%d")
            .map_err(|_| format!("mention_date must be YYYY-MM-DD (got '{}')", mention_date))?;

        let mention_price = parse_price(&mention_price)?;

        let ticker = self
            .ticker
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(NewPrediction {
            asset_market,
            ticker,
            mention_date,
            mention_price,
            direction,
        })
    }
}

fn parse_price(value: &serde_json::Value) -> Result<f64, String> {
    let price = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("mention_price must be a number (got {})", value))?;

    if !price.is_finite() || price <= 0.0 {
        return Err(format!("mention_price must be positive (got {})", price));
    }
    Ok(price)
}
