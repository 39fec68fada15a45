use chrono::{NaiveDate, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::DailyIndexPoint;

/// Inserts the point for `date`, or replaces the value if that date already
/// has one.
pub async fn upsert<'e, E>(executor: E, date: NaiveDate, algamja_index: f64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO daily_index (date, algamja_index, recorded_at)
        VALUES (?, ?, ?)
        ON CONFLICT (date)
        DO UPDATE SET algamja_index = excluded.algamja_index, recorded_at = excluded.recorded_at
        "#,
    )
    .bind(date)
    .bind(algamja_index)
    .bind(Utc::now())
    .execute(executor)
    .await?;
    Ok(())
}

/// The full series, oldest first.
pub async fn fetch_all<'e, E>(executor: E) -> Result<Vec<DailyIndexPoint>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, DailyIndexPoint>(
        "SELECT date, algamja_index FROM daily_index ORDER BY date ASC",
    )
    .fetch_all(executor)
    .await
}
