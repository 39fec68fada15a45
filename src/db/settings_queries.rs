use std::collections::BTreeMap;

use sqlx::{Executor, Sqlite};

pub async fn fetch_all<'e, E>(executor: E) -> Result<BTreeMap<String, String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM settings ORDER BY key")
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().collect())
}

pub async fn fetch_value<'e, E>(executor: E, key: &str) -> Result<Option<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(executor)
        .await
}

pub async fn upsert<'e, E>(executor: E, key: &str, value: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(executor)
    .await?;
    Ok(())
}
