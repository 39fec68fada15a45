use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::external::notifier::Notifier;
use crate::models::Direction;
use crate::services::index_engine::{self, IndexTotals};
use crate::services::prediction_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    /// Messaging credentials are not configured.
    Disabled,
}

/// One dashboard row: an asset with its counters and current stance.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub asset_market: String,
    pub hit: i64,
    pub miss: i64,
    pub direction: Option<Direction>,
}

impl ReportRow {
    fn stance(&self) -> &'static str {
        match self.direction {
            Some(Direction::Up) => "📈 UP",
            Some(Direction::Down) => "📉 DOWN",
            None => "  -  ",
        }
    }

    fn hit_rate(&self) -> String {
        let total = self.hit + self.miss;
        if total <= 0 {
            return "N/A".to_string();
        }
        format!("{}%", (self.hit as f64 / total as f64 * 100.0).round_ties_even() as i64)
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Renders the Telegram (HTML parse mode) dashboard message.
pub fn build_dashboard_report(
    rows: &[ReportRow],
    totals: IndexTotals,
    now: NaiveDateTime,
    dashboard_url: &str,
) -> String {
    let mut lines = vec![
        "📊 알감자지수 대시보드".to_string(),
        format!("업데이트: {}", now.format("%Y-%m-%d %H:%M")),
        String::new(),
        "자산시장       | 방향성  | 적중률".to_string(),
        "─".repeat(34),
    ];

    for row in rows {
        lines.push(format!(
            "{:<12} | {:<7} | {}",
            escape_html(&row.asset_market),
            row.stance(),
            row.hit_rate()
        ));
    }

    lines.push(String::new());
    lines.push(format!("🥔 종합 알감자지수: {:.1}%", totals.report_index()));
    lines.push(format!(
        "🥔 자세한 알감자지수를 보고싶다면 : <a href=\"{}\">알감자지수 대시보드 바로가기</a>",
        escape_html(dashboard_url)
    ));

    lines.join("\n")
}

/// Rows for every asset that has predictions, ascending by name.
pub async fn load_report_rows(pool: &SqlitePool) -> Result<Vec<ReportRow>, AppError> {
    let stats = prediction_service::asset_stats(pool).await?;

    let mut rows = Vec::with_capacity(stats.len());
    for stat in stats {
        let direction = prediction_service::latest_direction(pool, &stat.asset_market).await?;
        rows.push(ReportRow {
            asset_market: stat.asset_market,
            hit: stat.total_hit,
            miss: stat.total_miss,
            direction,
        });
    }
    Ok(rows)
}

pub async fn render_current_report(pool: &SqlitePool, dashboard_url: &str) -> Result<String, AppError> {
    let rows = load_report_rows(pool).await?;
    let totals = index_engine::current_totals(pool).await?;
    Ok(build_dashboard_report(&rows, totals, Local::now().naive_local(), dashboard_url))
}

/// Builds and sends the dashboard. Never fails: problems are logged and
/// reported through the returned status.
pub async fn send_dashboard_report(
    pool: &SqlitePool,
    notifier: Option<&dyn Notifier>,
    dashboard_url: &str,
) -> DeliveryStatus {
    let Some(notifier) = notifier else {
        warn!("⚠️ Skipping dashboard report - Telegram is not configured");
        return DeliveryStatus::Disabled;
    };

    let message = match render_current_report(pool, dashboard_url).await {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to build dashboard report: {}", e);
            return DeliveryStatus::Failed;
        }
    };

    match notifier.send(&message).await {
        Ok(()) => {
            info!("📊 Dashboard report sent");
            DeliveryStatus::Sent
        }
        Err(e) => {
            error!("Failed to send dashboard report: {}", e);
            DeliveryStatus::Failed
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use crate::external::notifier::NotifierError;
    use crate::models::{PredictionInput, SetResult};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    /// Records every message; fails on demand.
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: parking_lot::Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifierError> {
            if self.fail {
                return Err(NotifierError::Api("chat not found".into()));
            }
            self.sent.lock().push(text.to_string());
            Ok(())
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 30, 0).unwrap()
    }

    fn row(asset: &str, hit: i64, miss: i64, direction: Option<Direction>) -> ReportRow {
        ReportRow { asset_market: asset.into(), hit, miss, direction }
    }

    #[test]
    fn report_lists_rows_and_one_decimal_index() {
        let rows = vec![
            row("KOSPI", 2, 1, Some(Direction::Up)),
            row("금", 0, 0, Some(Direction::Down)),
        ];
        let text = build_dashboard_report(
            &rows,
            IndexTotals { total_hit: 2, total_miss: 1 },
            noon(),
            "https://example.test/",
        );
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "📊 알감자지수 대시보드");
        assert_eq!(lines[1], "업데이트: 2024-01-15 12:30");
        assert_eq!(lines[5], "KOSPI        | 📈 UP    | 67%");
        assert_eq!(lines[6], "금            | 📉 DOWN  | N/A");
        assert_eq!(lines[8], "🥔 종합 알감자지수: 66.7%");
        assert!(lines[9].contains("<a href=\"https://example.test/\">"));
    }

    #[test]
    fn hit_rate_halves_round_to_even() {
        assert_eq!(row("A", 1, 7, None).hit_rate(), "12%");
        assert_eq!(row("B", 3, 5, None).hit_rate(), "38%");
        assert_eq!(row("C", 1, 1, None).hit_rate(), "50%");
    }

    #[test]
    fn empty_ledger_reports_zero() {
        let text = build_dashboard_report(&[], IndexTotals::default(), noon(), "https://example.test/");
        assert!(text.contains("🥔 종합 알감자지수: 0.0%"));
    }

    #[test]
    fn asset_names_are_html_escaped() {
        let text = build_dashboard_report(
            &[row("S&P500", 1, 0, None)],
            IndexTotals { total_hit: 1, total_miss: 0 },
            noon(),
            "https://example.test/",
        );
        assert!(text.contains("S&amp;P500"));
        assert!(text.contains("|   -     | 100%"));
    }

    #[tokio::test]
    async fn disabled_without_notifier() {
        let pool = db::connect_in_memory().await.unwrap();
        assert_eq!(send_dashboard_report(&pool, None, "u").await, DeliveryStatus::Disabled);
    }

    #[tokio::test]
    async fn sends_current_ledger() {
        let pool = db::connect_in_memory().await.unwrap();
        let p = prediction_service::create(
            &pool,
            PredictionInput {
                asset_market: Some("NASDAQ".into()),
                ticker: None,
                mention_date: Some("2024-01-10".into()),
                mention_price: Some(serde_json::json!(15000)),
                direction: Some("DOWN".into()),
            },
        )
        .await
        .unwrap();
        prediction_service::set_result(&pool, p.id, SetResult { hit: Some(3), miss: Some(1) })
            .await
            .unwrap();

        let notifier = RecordingNotifier::default();
        let status = send_dashboard_report(&pool, Some(&notifier as &dyn Notifier), "https://example.test/").await;
        assert_eq!(status, DeliveryStatus::Sent);

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("NASDAQ       | 📉 DOWN  | 75%"));
        assert!(sent[0].contains("75.0%"));
    }

    #[tokio::test]
    async fn transport_failure_is_reported_not_raised() {
        let pool = db::connect_in_memory().await.unwrap();
        let notifier = RecordingNotifier { fail: true, ..Default::default() };
        assert_eq!(send_dashboard_report(&pool, Some(&notifier as &dyn Notifier), "u").await, DeliveryStatus::Failed);
    }
}
