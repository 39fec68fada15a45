use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("messaging API rejected the message: {0}")]
    Api(String),
}

/// Outbound channel for reports. Delivery is best-effort: callers log failures
/// and carry on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifierError>;
}
