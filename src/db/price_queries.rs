use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::PriceSnapshot;

/// Last write wins: a refresh always replaces the stored price for the asset.
pub async fn upsert_latest<'e, E>(
    executor: E,
    asset_market: &str,
    price: f64,
    fetched_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO prices (asset_market, current_price, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT (asset_market)
        DO UPDATE SET current_price = excluded.current_price, updated_at = excluded.updated_at
        "#,
    )
    .bind(asset_market)
    .bind(price)
    .bind(fetched_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn fetch_all<'e, E>(executor: E) -> Result<Vec<PriceSnapshot>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PriceSnapshot>(
        "SELECT asset_market, current_price, updated_at FROM prices ORDER BY asset_market",
    )
    .fetch_all(executor)
    .await
}

pub async fn fetch_latest<'e, E>(
    executor: E,
    asset_market: &str,
) -> Result<Option<PriceSnapshot>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, PriceSnapshot>(
        "SELECT asset_market, current_price, updated_at FROM prices WHERE asset_market = ?",
    )
    .bind(asset_market)
    .fetch_optional(executor)
    .await
}
