use chrono::Utc;
use sqlx::{Executor, FromRow, Sqlite};

use crate::models::{AssetStats, Direction, NewPrediction, Prediction, PredictionWithPrice, TrackedAsset};

const PREDICTION_COLUMNS: &str =
    "id, asset_market, ticker, mention_date, mention_price, direction, hit, miss, created_at";

/// Ledger-wide hit/miss sums.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct HitMissTotals {
    pub total_hit: i64,
    pub total_miss: i64,
    pub total_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CustomAssetRow {
    pub asset_market: String,
    pub ticker: Option<String>,
}

pub async fn create<'e, E>(executor: E, input: &NewPrediction) -> Result<Prediction, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Prediction>(&format!(
        "INSERT INTO predictions (asset_market, ticker, mention_date, mention_price, direction, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING {PREDICTION_COLUMNS}"
    ))
    .bind(&input.asset_market)
    .bind(&input.ticker)
    .bind(input.mention_date)
    .bind(input.mention_price)
    .bind(input.direction)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

/// Replaces every user-editable field. Counters and `created_at` are untouched.
pub async fn update<'e, E>(
    executor: E,
    id: i64,
    input: &NewPrediction,
) -> Result<Option<Prediction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Prediction>(&format!(
        "UPDATE predictions
         SET asset_market = ?, ticker = ?, mention_date = ?, mention_price = ?, direction = ?
         WHERE id = ?
         RETURNING {PREDICTION_COLUMNS}"
    ))
    .bind(&input.asset_market)
    .bind(&input.ticker)
    .bind(input.mention_date)
    .bind(input.mention_price)
    .bind(input.direction)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e, E>(executor: E, id: i64) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM predictions WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Writes whichever counters are given. Callers clamp before binding.
pub async fn set_counters<'e, E>(
    executor: E,
    id: i64,
    hit: Option<i64>,
    miss: Option<i64>,
) -> Result<Option<Prediction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Prediction>(&format!(
        "UPDATE predictions
         SET hit = COALESCE(?, hit), miss = COALESCE(?, miss)
         WHERE id = ?
         RETURNING {PREDICTION_COLUMNS}"
    ))
    .bind(hit)
    .bind(miss)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn fetch_all_with_prices<'e, E>(executor: E) -> Result<Vec<PredictionWithPrice>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PredictionWithPrice>(
        r#"
        SELECT p.id, p.asset_market, p.ticker, p.mention_date, p.mention_price,
               p.direction, p.hit, p.miss, p.created_at,
               pr.current_price, pr.updated_at AS price_updated
        FROM predictions p
        LEFT JOIN prices pr ON p.asset_market = pr.asset_market
        ORDER BY p.mention_date DESC, p.id DESC
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn fetch_totals<'e, E>(executor: E) -> Result<HitMissTotals, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, HitMissTotals>(
        "SELECT COALESCE(SUM(hit), 0) AS total_hit,
                COALESCE(SUM(miss), 0) AS total_miss,
                COUNT(*) AS total_count
         FROM predictions",
    )
    .fetch_one(executor)
    .await
}

pub async fn fetch_asset_stats<'e, E>(executor: E) -> Result<Vec<AssetStats>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, AssetStats>(
        r#"
        SELECT asset_market,
               COALESCE(SUM(hit), 0)  AS total_hit,
               COALESCE(SUM(miss), 0) AS total_miss,
               COUNT(*)               AS total_count
        FROM predictions
        GROUP BY asset_market
        ORDER BY asset_market
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Direction of the most recently dated prediction for an asset. Among equal
/// dates the latest inserted row wins.
pub async fn fetch_latest_direction<'e, E>(
    executor: E,
    asset_market: &str,
) -> Result<Option<Direction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, Direction>(
        "SELECT direction FROM predictions
         WHERE asset_market = ?
         ORDER BY mention_date DESC, id DESC
         LIMIT 1",
    )
    .bind(asset_market)
    .fetch_optional(executor)
    .await
}

/// Distinct individual securities referenced by the ledger (anything that is
/// not one of the tracked markets).
pub async fn fetch_custom_assets<'e, E>(executor: E) -> Result<Vec<CustomAssetRow>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let tracked = TrackedAsset::display_names();
    let placeholders = vec!["?"; tracked.len()].join(", ");
    let sql = format!(
        "SELECT DISTINCT asset_market, ticker FROM predictions
         WHERE asset_market NOT IN ({placeholders})
         ORDER BY asset_market"
    );

    let mut query = sqlx::query_as::<_, CustomAssetRow>(&sql);
    for name in tracked {
        query = query.bind(name);
    }
    let rows = query.fetch_all(executor).await?;
    Ok(rows)
}
