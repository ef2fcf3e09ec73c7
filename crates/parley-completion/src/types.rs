// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the completion engine API.

use serde::{Deserialize, Serialize};

/// One role-labeled turn of the transcript, as sent on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    /// "customer", "assistant", or "agent".
    pub role: String,
    pub content: String,
}

/// Request body for the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Full ordered message history of the conversation.
    pub messages: Vec<WireTurn>,
    /// Free-text context (originating page, cart snapshot), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Response body from the completion endpoint.
///
/// `flagged_for_human` and `confidence` are optional on the wire; when the
/// engine omits them they are derived from the reply text by
/// [`crate::heuristics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    #[serde(default)]
    pub flagged_for_human: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Error body returned by the completion endpoint on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}
