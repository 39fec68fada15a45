use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::notifier::Notifier;
use crate::external::price_provider::PriceProvider;
use crate::models::RefreshSummary;
use crate::services::report_service::{self, DeliveryStatus};
use crate::services::price_service;
use crate::services::settings_service::MIN_INTERVAL_MINUTES;

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub dashboard_url: String,
    pub last_refresh: Arc<parking_lot::Mutex<RefreshSummary>>,
}

/// Owns the single periodic refresh job.
///
/// `reset` swaps the job under `active_job`'s lock, so at most one periodic
/// job exists at any time even when settings are saved concurrently.
pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    active_job: Mutex<Option<Uuid>>,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            active_job: Mutex::new(None),
        })
    }

    pub fn context(&self) -> &JobContext {
        &self.context
    }

    pub async fn start(&self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;
        info!("✅ Job scheduler started");
        Ok(())
    }

    /// Replaces the periodic refresh job with one firing every `minutes`
    /// (never less than one minute).
    pub async fn reset(&self, minutes: u32) -> Result<(), AppError> {
        let minutes = minutes.max(MIN_INTERVAL_MINUTES);
        let mut active = self.active_job.lock().await;

        let scheduler = &self.scheduler;
        retire_job(&mut active, |old| async move {
            scheduler
                .remove(&old)
                .await
                .map_err(|e| AppError::External(format!("Failed to remove job {}: {}", old, e)))
        })
        .await?;

        let context = self.context.clone();
        let job = Job::new_repeated_async(Duration::from_secs(u64::from(minutes) * 60), move |_uuid, _l| {
            let context = context.clone();
            Box::pin(async move {
                execute_job_with_tracking("refresh_and_report", || run_cycle(context)).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create refresh job: {}", e)))?;

        let id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add refresh job: {}", e)))?;
        *active = Some(id);

        info!("📅 Scheduled: refresh_and_report - every {} minute(s)", minutes);
        Ok(())
    }

    /// Id of the periodic job, if one is armed.
    pub async fn active_job(&self) -> Option<Uuid> {
        *self.active_job.lock().await
    }

    /// Stop the scheduler gracefully
    pub async fn shutdown(&self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }
}

/// Removes the tracked job and clears the slot. On failure the id stays
/// tracked so the next reset can retry the removal.
async fn retire_job<F, Fut>(slot: &mut Option<Uuid>, remove: F) -> Result<(), AppError>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: std::future::Future<Output = Result<(), AppError>>,
{
    if let Some(old) = *slot {
        remove(old).await?;
        *slot = None;
    }
    Ok(())
}

#[derive(Debug)]
pub struct JobResult {
    pub items_processed: usize,
    pub items_failed: usize,
}

// Job tracking wrapper
pub async fn execute_job_with_tracking<F, Fut>(job_name: &str, job_fn: F)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn().await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => info!(
            "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
            job_name, job_result.items_processed, job_result.items_failed, duration_ms
        ),
        Err(e) => error!("❌ Job failed: {} - {} ({}ms)", job_name, e, duration_ms),
    }
}

/// Refreshes every price and remembers the outcome as the "last refresh".
pub async fn refresh_prices(ctx: JobContext) -> Result<JobResult, AppError> {
    info!("💰 Refreshing all prices...");
    let summary = price_service::refresh_all_prices(&ctx.pool, ctx.price_provider.as_ref()).await?;

    let result = JobResult {
        items_processed: summary.refreshed.len(),
        items_failed: summary.failed.len(),
    };
    *ctx.last_refresh.lock() = summary;
    Ok(result)
}

pub async fn send_report(ctx: JobContext) -> Result<JobResult, AppError> {
    let status = report_service::send_dashboard_report(&ctx.pool, ctx.notifier.as_deref(), &ctx.dashboard_url).await;
    Ok(match status {
        DeliveryStatus::Sent => JobResult { items_processed: 1, items_failed: 0 },
        DeliveryStatus::Failed => JobResult { items_processed: 0, items_failed: 1 },
        DeliveryStatus::Disabled => JobResult { items_processed: 0, items_failed: 0 },
    })
}

/// The periodic cycle: refresh prices (which snapshots today's index), then
/// send the dashboard report. A failed refresh still lets the report go out.
pub async fn run_cycle(ctx: JobContext) -> Result<JobResult, AppError> {
    let refreshed = match refresh_prices(ctx.clone()).await {
        Ok(result) => result,
        Err(e) => {
            error!("Price refresh failed: {}", e);
            JobResult { items_processed: 0, items_failed: 1 }
        }
    };
    let reported = send_report(ctx).await?;

    Ok(JobResult {
        items_processed: refreshed.items_processed + reported.items_processed,
        items_failed: refreshed.items_failed + reported.items_failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::price_service::tests::FakeProvider;
    use crate::services::report_service::tests::RecordingNotifier;

    async fn context(notifier: Option<Arc<dyn Notifier>>) -> JobContext {
        JobContext {
            pool: db::connect_in_memory().await.unwrap(),
            price_provider: Arc::new(FakeProvider::with_prices(&[("^GSPC", 5000.0)])),
            notifier,
            dashboard_url: "https://example.test/".to_string(),
            last_refresh: Arc::new(parking_lot::Mutex::new(RefreshSummary::default())),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reset_keeps_exactly_one_job() {
        let service = JobSchedulerService::new(context(None).await).await.unwrap();
        assert_eq!(service.active_job().await, None);

        service.reset(5).await.unwrap();
        let first = service.active_job().await.unwrap();

        service.reset(0).await.unwrap();
        let second = service.active_job().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn failed_removal_keeps_job_tracked() {
        let id = Uuid::new_v4();
        let mut slot = Some(id);

        let result = retire_job(&mut slot, |_| async { Err(AppError::External("scheduler busy".into())) }).await;
        assert!(result.is_err());
        assert_eq!(slot, Some(id));

        retire_job(&mut slot, |old| async move {
            assert_eq!(old, id);
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(slot, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cycle_records_last_refresh_and_reports() {
        let recorder = Arc::new(RecordingNotifier::default());
        let ctx = context(Some(recorder.clone() as Arc<dyn Notifier>)).await;

        let result = run_cycle(ctx.clone()).await.unwrap();

        let last = ctx.last_refresh.lock().clone();
        assert_eq!(last.refreshed, vec!["S&P500".to_string()]);
        assert_eq!(last.failed.len(), 7);
        assert_eq!(recorder.sent.lock().len(), 1);
        assert_eq!(result.items_processed, 2);
        assert_eq!(result.items_failed, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cycle_without_messaging_still_refreshes() {
        let ctx = context(None).await;
        run_cycle(ctx.clone()).await.unwrap();
        assert!(ctx.last_refresh.lock().finished_at.is_some());
    }
}
