//! Process configuration, resolved once at startup.
//!
//! Messaging credentials, the admin secret and the storage location live in
//! [`Config`] and reach the components that need them through `AppState` /
//! `JobContext`.

use std::env;
use std::time::Duration;

use crate::logging::LoggingConfig;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://algamja.db";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_DASHBOARD_URL: &str = "https://algamja-dashboard-production.up.railway.app/";

#[derive(Debug, Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub channel_id: String,
    /// Telegram user ids allowed to run mutating bot commands.
    pub admin_ids: Vec<i64>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.channel_id.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub admin_password: String,
    pub secret_key: String,
    pub dashboard_url: String,
    pub price_timeout: Duration,
    pub telegram: TelegramConfig,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .or_else(|| env::var("DATABASE_PATH").ok().map(|p| format!("sqlite://{}", p)))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let price_timeout_secs = env::var("PRICE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(10);

        let telegram = TelegramConfig {
            bot_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            channel_id: env::var("TELEGRAM_CHANNEL_ID").unwrap_or_default(),
            admin_ids: parse_admin_ids(&env::var("TELEGRAM_ADMIN_IDS").unwrap_or_default()),
        };

        Self {
            database_url,
            port,
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "algamja2024".to_string()),
            secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| "algamja-secret-key-2024".to_string()),
            dashboard_url: env::var("DASHBOARD_URL").unwrap_or_else(|_| DEFAULT_DASHBOARD_URL.to_string()),
            price_timeout: Duration::from_secs(price_timeout_secs),
            telegram,
            logging: LoggingConfig::from_env(),
        }
    }

    /// Logs the parts of the configuration that change runtime behaviour.
    /// Secrets are never printed.
    pub fn log_summary(&self) {
        tracing::info!("⚙️ Database: {}", self.database_url);
        tracing::info!("⚙️ Price fetch timeout: {}s", self.price_timeout.as_secs());
        if self.telegram.is_configured() {
            tracing::info!(
                "⚙️ Telegram enabled (channel {}, {} bot operator(s))",
                self.telegram.channel_id,
                self.telegram.admin_ids.len()
            );
        } else {
            tracing::warn!("⚠️ TELEGRAM_BOT_TOKEN / TELEGRAM_CHANNEL_ID not set - Telegram disabled");
        }
        if env::var("ADMIN_PASSWORD").is_err() {
            tracing::warn!("⚠️ ADMIN_PASSWORD not set - using the built-in default");
        }
    }
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!("Ignoring invalid TELEGRAM_ADMIN_IDS entry '{}'", s);
                None
            }
        })
        .collect()
}

impl Config {
    /// Configuration for a throwaway in-memory instance with messaging disabled.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            admin_password: "test-password".to_string(),
            secret_key: "test-secret".to_string(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            price_timeout: Duration::from_secs(1),
            telegram: TelegramConfig::default(),
            logging: LoggingConfig {
                loki_enabled: false,
                loki_url: None,
                service_name: "algamja".to_string(),
                environment: "test".to_string(),
                log_level: "warn".to_string(),
            },
        }
    }
}
