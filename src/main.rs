use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use algamja_backend::app;
use algamja_backend::config::Config;
use algamja_backend::db;
use algamja_backend::external::coingecko::CoinGeckoProvider;
use algamja_backend::external::multi_provider::AssetPriceRouter;
use algamja_backend::external::notifier::Notifier;
use algamja_backend::external::price_provider::{http_client, PriceProvider};
use algamja_backend::external::telegram::{TelegramClient, TelegramNotifier};
use algamja_backend::external::yahoo::YahooProvider;
use algamja_backend::logging::init_logging;
use algamja_backend::services::bot_service::{self, BotContext};
use algamja_backend::services::job_scheduler_service::{execute_job_with_tracking, refresh_prices};
use algamja_backend::services::settings_service;
use algamja_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Initialize logging FIRST
    init_logging(config.logging.clone()).map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    config.log_summary();

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    let client = http_client(config.price_timeout)?;
    let provider: Arc<dyn PriceProvider> = Arc::new(AssetPriceRouter::new(
        Box::new(YahooProvider::new(client.clone())),
        Box::new(CoinGeckoProvider::new(client.clone())),
    ));
    info!("📊 Using price providers: Yahoo Finance + CoinGecko");

    let notifier: Option<Arc<dyn Notifier>> =
        TelegramNotifier::new(client.clone(), &config.telegram).map(|n| Arc::new(n) as Arc<dyn Notifier>);

    let state = AppState::new(pool.clone(), config.clone(), provider, notifier).await?;

    state.scheduler.start().await?;
    let minutes = settings_service::get_interval(&pool).await?;
    state.scheduler.reset(minutes).await?;

    // Prices are stale until the first cycle; don't wait a whole interval.
    let ctx = state.job_context();
    tokio::spawn(async move {
        execute_job_with_tracking("startup_refresh", || refresh_prices(ctx)).await;
    });

    if config.telegram.bot_token.is_empty() {
        warn!("⚠️ TELEGRAM_BOT_TOKEN not set - bot commands disabled");
    } else {
        let bot = BotContext {
            pool: pool.clone(),
            admin_ids: config.telegram.admin_ids.clone(),
        };
        let api = TelegramClient::new(client.clone(), config.telegram.bot_token.clone());
        tokio::spawn(bot_service::run_bot(bot, api));
    }

    let scheduler = state.scheduler.clone();
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Algamja backend running at http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}
