use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Latest fetched price for an asset. Overwritten on every successful refresh.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceSnapshot {
    pub asset_market: String,
    pub current_price: f64,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshSummary {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub refreshed: Vec<String>,
    pub failed: Vec<String>,
}
