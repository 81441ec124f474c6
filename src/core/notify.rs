//! Notification delivery abstraction

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}

/// Writes alerts to the log instead of delivering them. Used when no
/// webhook is configured.
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        info!(%subject, "Alert (no dispatcher configured):\n{body}");
        Ok(())
    }
}
