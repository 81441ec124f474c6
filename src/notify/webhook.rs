//! Webhook delivery for analysis alerts.

use crate::core::notify::NotificationDispatcher;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Posts `{subject, body}` JSON to a configured endpoint. A non-success
/// status is an error so the caller keeps the alert pending for retry.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: &str, timeout_secs: Option<u64>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .context("Failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        debug!(url = %self.url, %subject, "Posting alert to webhook");
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "subject": subject, "body": body }))
            .send()
            .await
            .with_context(|| format!("Webhook request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Webhook at {} returned status {status}", self.url));
        }
        Ok(())
    }
}
