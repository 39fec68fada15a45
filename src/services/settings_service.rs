use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db;
use crate::errors::AppError;

pub const UPDATE_INTERVAL_KEY: &str = "update_interval";
pub const DEFAULT_INTERVAL_MINUTES: u32 = 5;
/// Lowest refresh interval the scheduler will ever be armed with.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

pub async fn get_all(pool: &SqlitePool) -> Result<BTreeMap<String, String>, AppError> {
    Ok(db::settings_queries::fetch_all(pool).await?)
}

/// Refresh interval in minutes: the stored value, 5 when absent or not an
/// integer, and never below one minute.
pub async fn get_interval(pool: &SqlitePool) -> Result<u32, AppError> {
    let raw = db::settings_queries::fetch_value(pool, UPDATE_INTERVAL_KEY).await?;
    Ok(coerce_interval(raw.as_deref()))
}

pub fn coerce_interval(raw: Option<&str>) -> u32 {
    let Some(raw) = raw else {
        return DEFAULT_INTERVAL_MINUTES;
    };
    match raw.trim().parse::<i64>() {
        Ok(minutes) if minutes < MIN_INTERVAL_MINUTES as i64 => {
            warn!("Stored {} of {} is below the floor, using {}", UPDATE_INTERVAL_KEY, minutes, MIN_INTERVAL_MINUTES);
            MIN_INTERVAL_MINUTES
        }
        Ok(minutes) => u32::try_from(minutes).unwrap_or(u32::MAX),
        Err(_) => {
            warn!("Stored {} '{}' is not an integer, using default {}", UPDATE_INTERVAL_KEY, raw, DEFAULT_INTERVAL_MINUTES);
            DEFAULT_INTERVAL_MINUTES
        }
    }
}

/// Normalizes one incoming setting to its stored string form.
fn normalize(key: &str, value: &serde_json::Value) -> Result<String, String> {
    let text = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => return Err(format!("{} cannot be null", key)),
        other => other.to_string(),
    };

    if key == UPDATE_INTERVAL_KEY {
        let minutes = text
            .parse::<i64>()
            .map_err(|_| format!("{} must be an integer number of minutes (got '{}')", key, text))?;
        if minutes < MIN_INTERVAL_MINUTES as i64 {
            return Err(format!("{} must be at least {} minute(s)", key, MIN_INTERVAL_MINUTES));
        }
        return Ok(minutes.to_string());
    }

    Ok(text)
}

/// Validates every entry before writing any of them, then writes them all in
/// one transaction. Returns whether the refresh interval was part of the update.
pub async fn update(
    pool: &SqlitePool,
    updates: BTreeMap<String, serde_json::Value>,
) -> Result<bool, AppError> {
    let mut normalized = Vec::with_capacity(updates.len());
    for (key, value) in &updates {
        if key.trim().is_empty() {
            return Err(AppError::Validation("Setting keys cannot be empty".to_string()));
        }
        let value = normalize(key, value).map_err(AppError::Validation)?;
        normalized.push((key.clone(), value));
    }

    let mut tx = pool.begin().await?;
    for (key, value) in &normalized {
        db::settings_queries::upsert(&mut *tx, key, value).await?;
    }
    tx.commit().await?;

    info!("⚙️ Updated {} setting(s)", normalized.len());
    Ok(updates.contains_key(UPDATE_INTERVAL_KEY))
}
