// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifier implementations.
//!
//! Notifications are fire-and-forget: the engine spawns them off the
//! request path and failures are logged, never propagated.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use parley_config::model::NotifyConfig;
use parley_core::{Notifier, ParleyError};
use parley_realtime::Backoff;

/// Notifier that only writes to the log. Used when no webhook is
/// configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), ParleyError> {
        info!(subject, body, "support notification");
        Ok(())
    }
}

/// Notifier that POSTs `{ subject, body }` to a configured webhook,
/// retrying once after a short backoff.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, ParleyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ParleyError::Config(format!("notifier client: {e}")))?;
        Ok(Self { client, url })
    }

    async fn post(&self, subject: &str, body: &str) -> Result<(), reqwest::Error> {
        self.client
            .post(&self.url)
            .json(&serde_json::json!({ "subject": subject, "body": body }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), ParleyError> {
        let mut backoff = Backoff::new(Duration::from_millis(250), Duration::from_secs(2));
        for attempt in 0..2 {
            match self.post(subject, body).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt == 0 => {
                    warn!(error = %e, "webhook notification failed, retrying");
                    tokio::time::sleep(backoff.next_delay()).await;
                }
                Err(e) => {
                    return Err(ParleyError::Channel {
                        message: format!("webhook notification failed: {e}"),
                        source: Some(Box::new(e)),
                    })
                }
            }
        }
        unreachable!("loop returns on success or second failure")
    }
}

/// Pick the notifier implied by configuration.
pub fn from_config(config: &NotifyConfig) -> Result<Box<dyn Notifier>, ParleyError> {
    match &config.webhook_url {
        Some(url) => Ok(Box::new(WebhookNotifier::new(url.clone())?)),
        None => Ok(Box::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        LogNotifier.notify("subject", "body").await.unwrap();
    }

    #[test]
    fn config_selects_webhook_when_url_present() {
        let log_only = from_config(&NotifyConfig { webhook_url: None }).unwrap();
        drop(log_only);
        let webhook = from_config(&NotifyConfig {
            webhook_url: Some("http://127.0.0.1:1/hook".into()),
        });
        assert!(webhook.is_ok());
    }
}
