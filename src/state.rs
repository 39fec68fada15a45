use std::sync::Arc;

use parking_lot::Mutex;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::errors::AppError;
use crate::external::notifier::Notifier;
use crate::external::price_provider::PriceProvider;
use crate::models::RefreshSummary;
use crate::services::auth_service::AuthService;
use crate::services::job_scheduler_service::{JobContext, JobSchedulerService};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub price_provider: Arc<dyn PriceProvider>,
    pub notifier: Option<Arc<dyn Notifier>>,
    pub scheduler: Arc<JobSchedulerService>,
    pub auth: Arc<AuthService>,
    pub last_refresh: Arc<Mutex<RefreshSummary>>,
}

impl AppState {
    /// Wires the shared services around an open pool. The scheduler is created
    /// here but not started.
    pub async fn new(
        pool: SqlitePool,
        config: Config,
        price_provider: Arc<dyn PriceProvider>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Result<Self, AppError> {
        let last_refresh = Arc::new(Mutex::new(RefreshSummary::default()));
        let scheduler = JobSchedulerService::new(JobContext {
            pool: pool.clone(),
            price_provider: price_provider.clone(),
            notifier: notifier.clone(),
            dashboard_url: config.dashboard_url.clone(),
            last_refresh: last_refresh.clone(),
        })
        .await?;
        let auth = AuthService::new(&config.admin_password, &config.secret_key)?;

        Ok(Self {
            pool,
            config: Arc::new(config),
            price_provider,
            notifier,
            scheduler: Arc::new(scheduler),
            auth: Arc::new(auth),
            last_refresh,
        })
    }

    /// Context for one-off background jobs (manual refresh / report).
    pub fn job_context(&self) -> JobContext {
        self.scheduler.context().clone()
    }
}
