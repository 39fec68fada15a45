//! The algamja index: the share of judged predictions that turned out right.
//!
//! `index = total_hit / (total_hit + total_miss) * 100`, with two decimals for
//! storage and the API and one decimal for human-readable text. A ledger with
//! no judgements at all has an index of exactly 0.
//!
//! The daily series is only ever written here. A snapshot is skipped entirely
//! while nothing has been judged, so the chart shows a gap instead of a
//! misleading 0%.

use chrono::{Local, NaiveDate};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::db;
use crate::db::prediction_queries::HitMissTotals;
use crate::errors::AppError;
use crate::models::DailyIndexPoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexTotals {
    pub total_hit: i64,
    pub total_miss: i64,
}

impl IndexTotals {
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (i64, i64)>,
    {
        counts.into_iter().fold(Self::default(), |acc, (hit, miss)| Self {
            total_hit: acc.total_hit + hit,
            total_miss: acc.total_miss + miss,
        })
    }

    pub fn total(&self) -> i64 {
        self.total_hit + self.total_miss
    }

    /// Index rounded to two decimals, as stored and served by the API.
    pub fn aggregate_index(&self) -> f64 {
        self.ratio().map(|r| round_to(r, 2)).unwrap_or(0.0)
    }

    /// Index rounded to one decimal, for report and bot text.
    pub fn report_index(&self) -> f64 {
        self.ratio().map(|r| round_to(r, 1)).unwrap_or(0.0)
    }

    fn ratio(&self) -> Option<f64> {
        let total = self.total();
        if total <= 0 {
            return None;
        }
        Some(self.total_hit as f64 / total as f64 * 100.0)
    }
}

impl From<HitMissTotals> for IndexTotals {
    fn from(t: HitMissTotals) -> Self {
        Self {
            total_hit: t.total_hit,
            total_miss: t.total_miss,
        }
    }
}

/// Aggregate index over raw `(hit, miss)` pairs.
pub fn compute_aggregate_index<I>(counts: I) -> f64
where
    I: IntoIterator<Item = (i64, i64)>,
{
    IndexTotals::from_counts(counts).aggregate_index()
}

/// Rounds to `decimals` places; exact halves go to the even neighbour
/// (3.125 -> 3.12).
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// The calendar date snapshots are keyed by.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotOutcome {
    Recorded(f64),
    /// Nothing has been judged yet; the series was left untouched.
    Skipped,
}

pub async fn current_totals(pool: &SqlitePool) -> Result<IndexTotals, AppError> {
    let totals = db::prediction_queries::fetch_totals(pool).await?;
    Ok(totals.into())
}

/// Recomputes the index and upserts the point for `date`.
///
/// Runs on the caller's connection so that a mutation and its snapshot can
/// share one transaction.
pub async fn snapshot_today(
    conn: &mut SqliteConnection,
    date: NaiveDate,
) -> Result<SnapshotOutcome, sqlx::Error> {
    let totals: IndexTotals = db::prediction_queries::fetch_totals(&mut *conn).await?.into();

    if totals.total() == 0 {
        debug!("Skipping daily index snapshot for {} - no judged predictions", date);
        return Ok(SnapshotOutcome::Skipped);
    }

    let index = totals.aggregate_index();
    db::daily_index_queries::upsert(&mut *conn, date, index).await?;
    info!("🥔 Daily index for {}: {:.2}% ({} hit / {} miss)", date, index, totals.total_hit, totals.total_miss);
    Ok(SnapshotOutcome::Recorded(index))
}

/// Standalone snapshot in its own transaction (used by the refresh cycle).
pub async fn record_snapshot(pool: &SqlitePool, date: NaiveDate) -> Result<SnapshotOutcome, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = snapshot_today(&mut tx, date).await?;
    tx.commit().await?;
    Ok(outcome)
}

pub async fn daily_series(pool: &SqlitePool) -> Result<Vec<DailyIndexPoint>, AppError> {
    Ok(db::daily_index_queries::fetch_all(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::prediction_queries;
    use crate::models::{Direction, NewPrediction};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn seed(pool: &SqlitePool, asset: &str, hit: i64, miss: i64) -> i64 {
        let created = prediction_queries::create(
            pool,
            &NewPrediction {
                asset_market: asset.to_string(),
                ticker: None,
                mention_date: date("2024-01-10"),
                mention_price: 100.0,
                direction: Direction::Up,
            },
        )
        .await
        .unwrap();
        prediction_queries::set_counters(pool, created.id, Some(hit), Some(miss))
            .await
            .unwrap();
        created.id
    }

    #[test]
    fn empty_ledger_index_is_zero() {
        assert_eq!(compute_aggregate_index(Vec::<(i64, i64)>::new()), 0.0);
        assert_eq!(compute_aggregate_index(vec![(0, 0), (0, 0)]), 0.0);
        assert_eq!(IndexTotals::default().report_index(), 0.0);
    }

    #[test]
    fn index_is_hit_share_rounded_to_two_decimals() {
        assert_eq!(compute_aggregate_index(vec![(3, 1), (0, 0)]), 75.0);
        assert_eq!(compute_aggregate_index(vec![(1, 2)]), 33.33);
        assert_eq!(compute_aggregate_index(vec![(2, 1)]), 66.67);
        assert_eq!(compute_aggregate_index(vec![(0, 5)]), 0.0);
        assert_eq!(compute_aggregate_index(vec![(5, 0)]), 100.0);
    }

    #[test]
    fn report_index_uses_one_decimal() {
        let totals = IndexTotals { total_hit: 2, total_miss: 1 };
        assert_eq!(totals.report_index(), 66.7);
        assert_eq!(totals.aggregate_index(), 66.67);
    }

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(compute_aggregate_index(vec![(1, 31)]), 3.12);
        assert_eq!(IndexTotals { total_hit: 1, total_miss: 15 }.report_index(), 6.2);
        assert_eq!(IndexTotals { total_hit: 3, total_miss: 5 }.report_index(), 37.5);
        assert_eq!(round_to(0.375, 2), 0.38);
    }

    #[test]
    fn index_stays_within_bounds() {
        for hit in 0..20 {
            for miss in 0..20 {
                let idx = compute_aggregate_index(vec![(hit, miss)]);
                assert!((0.0..=100.0).contains(&idx), "{} out of range for {}/{}", idx, hit, miss);
                if hit + miss > 0 {
                    let expected = round_to(hit as f64 / (hit + miss) as f64 * 100.0, 2);
                    assert_eq!(idx, expected);
                }
            }
        }
    }

    #[tokio::test]
    async fn snapshot_skips_when_nothing_judged() {
        let pool = db::connect_in_memory().await.unwrap();
        seed(&pool, "KOSPI", 0, 0).await;

        let outcome = record_snapshot(&pool, date("2024-01-15")).await.unwrap();
        assert_eq!(outcome, SnapshotOutcome::Skipped);
        assert!(daily_series(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_on_empty_ledger_keeps_existing_point() {
        let pool = db::connect_in_memory().await.unwrap();
        db::daily_index_queries::upsert(&pool, date("2024-01-15"), 42.0).await.unwrap();

        let outcome = record_snapshot(&pool, date("2024-01-15")).await.unwrap();
        assert_eq!(outcome, SnapshotOutcome::Skipped);

        let series = daily_series(&pool).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].algamja_index, 42.0);
    }

    #[tokio::test]
    async fn snapshot_upserts_one_point_per_date() {
        let pool = db::connect_in_memory().await.unwrap();
        let id = seed(&pool, "KOSPI", 3, 1).await;
        seed(&pool, "금", 0, 0).await;

        let day = date("2024-01-15");
        assert_eq!(record_snapshot(&pool, day).await.unwrap(), SnapshotOutcome::Recorded(75.0));
        assert_eq!(record_snapshot(&pool, day).await.unwrap(), SnapshotOutcome::Recorded(75.0));

        prediction_queries::set_counters(&pool, id, Some(1), Some(1)).await.unwrap();
        assert_eq!(record_snapshot(&pool, day).await.unwrap(), SnapshotOutcome::Recorded(50.0));

        let series = daily_series(&pool).await.unwrap();
        assert_eq!(series, vec![DailyIndexPoint { date: day, algamja_index: 50.0 }]);
    }

    #[tokio::test]
    async fn series_is_sorted_by_date() {
        let pool = db::connect_in_memory().await.unwrap();
        seed(&pool, "KOSPI", 1, 0).await;

        for d in ["2024-01-17", "2024-01-15", "2024-01-16"] {
            record_snapshot(&pool, date(d)).await.unwrap();
        }

        let dates: Vec<NaiveDate> = daily_series(&pool).await.unwrap().into_iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![date("2024-01-15"), date("2024-01-16"), date("2024-01-17")]);
    }
}
