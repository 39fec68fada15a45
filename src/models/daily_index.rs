use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// One persisted aggregate index value per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DailyIndexPoint {
    pub date: NaiveDate,
    pub algamja_index: f64,
}

/// Accuracy summary for a single asset. Percentages are left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AssetStats {
    pub asset_market: String,
    pub total_hit: i64,
    pub total_miss: i64,
    pub total_count: i64,
}
