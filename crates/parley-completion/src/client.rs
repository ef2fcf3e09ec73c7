// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the completion engine.
//!
//! Handles request construction, authentication, and transient error
//! retry. The caller's timeout (the chat service's fallback path) bounds
//! the whole call; the client additionally caps the underlying HTTP
//! request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use parley_config::model::CompletionConfig;
use parley_core::{CompletionEngine, CompletionOutcome, ParleyError, TranscriptTurn};

use crate::heuristics;
use crate::types::{ApiErrorResponse, CompletionRequest, CompletionResponse, WireTurn};

/// HTTP client for the completion engine endpoint.
///
/// Retries once on transient errors (429, 500, 503) after a 1-second
/// delay, matching the upstream service's documented behavior.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl HttpCompletionClient {
    /// Build a client from configuration.
    pub fn new(config: &CompletionConfig) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| ParleyError::Config(format!("invalid API key header: {e}")))?;
            headers.insert("authorization", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ParleyError::Completion {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            max_retries: 1,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    async fn send(&self, request: &CompletionRequest) -> Result<CompletionResponse, ParleyError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying completion request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(request)
                .send()
                .await
                .map_err(|e| ParleyError::Completion {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "completion response received");

            if status.is_success() {
                return response.json::<CompletionResponse>().await.map_err(|e| {
                    ParleyError::Completion {
                        message: format!("malformed completion response: {e}"),
                        source: Some(Box::new(e)),
                    }
                });
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(ParleyError::Completion {
                    message: format!("engine returned {status}: {body}"),
                    source: None,
                });
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                format!(
                    "completion engine error ({}): {}",
                    api_err.error.type_, api_err.error.message
                )
            } else {
                format!("engine returned {status}: {body}")
            };
            return Err(ParleyError::Completion {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| ParleyError::Completion {
            message: "completion request failed after retries".into(),
            source: None,
        }))
    }
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[async_trait]
impl CompletionEngine for HttpCompletionClient {
    async fn complete(
        &self,
        history: &[TranscriptTurn],
        context: Option<&str>,
    ) -> Result<CompletionOutcome, ParleyError> {
        let request = CompletionRequest {
            messages: history
                .iter()
                .map(|turn| WireTurn {
                    role: turn.role.to_string(),
                    content: turn.text.clone(),
                })
                .collect(),
            context: context.map(str::to_string),
        };

        let response = self.send(&request).await?;

        // Signals the engine omits are derived from the reply text.
        let confidence = response
            .confidence
            .unwrap_or_else(|| heuristics::score_confidence(&response.text));
        let flagged_for_human = response
            .flagged_for_human
            .unwrap_or_else(|| heuristics::suggests_handoff(&response.text));

        Ok(CompletionOutcome {
            text: response.text,
            flagged_for_human,
            confidence,
        })
    }
}
