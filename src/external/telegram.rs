use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TelegramConfig;
use crate::external::notifier::{Notifier, NotifierError};

const API_BASE: &str = "https://api.telegram.org";
/// Server-side wait for `getUpdates` long polling.
pub const LONG_POLL_SECS: u64 = 25;

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

/// Thin client for the Bot API methods we use.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    token: String,
}

impl TelegramClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self { client, token: token.into() }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), NotifierError> {
        let payload = SendMessagePayload {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        let response = self.client.post(self.method_url("sendMessage")).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let description = response
                .json::<ApiResponse<serde_json::Value>>()
                .await
                .ok()
                .and_then(|r| r.description)
                .unwrap_or_else(|| status.to_string());
            return Err(NotifierError::Api(description));
        }

        Ok(())
    }

    /// Long-polls for updates after `offset`, waiting up to `wait_secs`.
    pub async fn get_updates(&self, offset: i64, wait_secs: u64) -> Result<Vec<Update>, NotifierError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", wait_secs.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .timeout(Duration::from_secs(wait_secs + 10))
            .send()
            .await?;

        let body = response.json::<ApiResponse<Vec<Update>>>().await?;
        if !body.ok {
            return Err(NotifierError::Api(
                body.description.unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }
        Ok(body.result.unwrap_or_default())
    }
}

/// Posts HTML-formatted reports to the configured channel.
pub struct TelegramNotifier {
    api: TelegramClient,
    channel_id: String,
}

impl TelegramNotifier {
    /// Returns `None` if the token or channel is missing from the configuration,
    /// which disables reporting.
    pub fn new(client: Client, config: &TelegramConfig) -> Option<Self> {
        if !config.is_configured() {
            warn!("Telegram notifier is not configured (missing bot token or channel id)");
            return None;
        }
        Some(Self {
            api: TelegramClient::new(client, config.bot_token.clone()),
            channel_id: config.channel_id.clone(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifierError> {
        self.api.send_message(&self.channel_id, text, Some("HTML")).await?;
        info!("📨 Report delivered to Telegram channel {}", self.channel_id);
        Ok(())
    }
}
