use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::WebhookPayload;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, payload: &WebhookPayload) -> Result<()>;
}

/// Posts alert embeds to a Discord-compatible webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, payload: &WebhookPayload) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .context("webhook request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("webhook returned {status}: {body}");
        }

        tracing::debug!(title = %payload.embeds.first().map_or("", |e| e.title.as_str()), "alert delivered");
        Ok(())
    }
}
