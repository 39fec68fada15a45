use sqlx::SqlitePool;
use tracing::{error, info};

use crate::db;
use crate::errors::AppError;
use crate::models::{
    AssetStats, Direction, NewPrediction, Prediction, PredictionInput, PredictionListing, SetResult,
};
use crate::services::index_engine::{self, IndexTotals};

pub async fn list(pool: &SqlitePool) -> Result<PredictionListing, AppError> {
    let predictions = db::prediction_queries::fetch_all_with_prices(pool).await.map_err(|e| {
        error!("Failed to list predictions: {}", e);
        AppError::Db(e)
    })?;
    let totals = index_engine::current_totals(pool).await?;

    Ok(PredictionListing {
        predictions,
        total_hit: totals.total_hit,
        total_miss: totals.total_miss,
        algamja_index: totals.aggregate_index(),
    })
}

/// Adding a prediction never touches the daily series; only grading does.
pub async fn create(pool: &SqlitePool, input: PredictionInput) -> Result<Prediction, AppError> {
    let new = input.validate().map_err(AppError::Validation)?;
    insert(pool, &new).await
}

pub async fn insert(pool: &SqlitePool, new: &NewPrediction) -> Result<Prediction, AppError> {
    let prediction = db::prediction_queries::create(pool, new).await.map_err(|e| {
        error!("Failed to create prediction for {}: {}", new.asset_market, e);
        AppError::Db(e)
    })?;
    info!(
        "➕ Prediction #{} added: {} {} @ {} ({})",
        prediction.id, prediction.asset_market, prediction.direction, prediction.mention_price, prediction.mention_date
    );
    Ok(prediction)
}

pub async fn update(pool: &SqlitePool, id: i64, input: PredictionInput) -> Result<Prediction, AppError> {
    let new = input.validate().map_err(AppError::Validation)?;
    db::prediction_queries::update(pool, id, &new)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prediction {} not found", id)))
}

/// Deletes the prediction and re-snapshots today's index in the same
/// transaction, so the series never reflects a ledger that no longer exists.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let deleted = db::prediction_queries::delete(&mut *tx, id).await?;
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Prediction {} not found", id)));
    }

    index_engine::snapshot_today(&mut tx, index_engine::today()).await?;
    tx.commit().await?;

    info!("🗑️ Prediction #{} deleted", id);
    Ok(())
}

/// Sets the hit/miss counters. Negative values are clamped to 0; omitted
/// counters keep their current value.
pub async fn set_result(pool: &SqlitePool, id: i64, result: SetResult) -> Result<Prediction, AppError> {
    let hit = result.hit.map(|h| h.max(0));
    let miss = result.miss.map(|m| m.max(0));

    let mut tx = pool.begin().await?;

    let updated = db::prediction_queries::set_counters(&mut *tx, id, hit, miss)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prediction {} not found", id)))?;

    index_engine::snapshot_today(&mut tx, index_engine::today()).await?;
    tx.commit().await?;

    info!("🎯 Prediction #{} graded: hit={} miss={}", id, updated.hit, updated.miss);
    Ok(updated)
}

pub async fn asset_stats(pool: &SqlitePool) -> Result<Vec<AssetStats>, AppError> {
    Ok(db::prediction_queries::fetch_asset_stats(pool).await?)
}

/// Current stance for an asset: the direction of its most recently dated
/// prediction, if it has any.
pub async fn latest_direction(pool: &SqlitePool, asset_market: &str) -> Result<Option<Direction>, AppError> {
    Ok(db::prediction_queries::fetch_latest_direction(pool, asset_market).await?)
}

/// Ledger-wide totals plus the record count, as shown by the bot's `/status`.
pub async fn status(pool: &SqlitePool) -> Result<(IndexTotals, i64), AppError> {
    let totals = db::prediction_queries::fetch_totals(pool).await?;
    Ok((totals.into(), totals.total_count))
}
