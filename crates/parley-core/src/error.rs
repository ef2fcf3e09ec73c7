// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley support engine.

use thiserror::Error;

/// The primary error type used across all Parley components.
///
/// The taxonomy mirrors the user-visible failure modes: validation and rate
/// limiting map 1:1 to client responses, storage failures are redirected into
/// degraded mode on the customer path, and channel/notification failures are
/// logged and swallowed rather than propagated.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Bad input (empty body, oversized body, incomplete lead contact).
    /// No state change has occurred.
    #[error("validation error: {0}")]
    Validation(String),

    /// Sliding-window rate limit exceeded. Retryable; carries a backoff hint.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Administrative secret mismatch or missing credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Attempt to write to a terminal conversation. The customer must start
    /// a new session.
    #[error("conversation {conversation_id} is resolved")]
    ConversationResolved { conversation_id: String },

    /// Persistent store errors (connection, query failure, serialization).
    /// On the customer message path these trigger degraded mode instead of
    /// surfacing to the caller.
    #[error("storage error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion engine errors (API failure, malformed response).
    #[error("completion error: {message}")]
    Completion {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Real-time channel errors (publish failure, no subscribers guarantee).
    /// Never fails the primary write.
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out (dominant case: a stalled completion call).
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// True when the failure should divert the customer path into degraded
    /// mode rather than surface as an error.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, ParleyError::Store { .. })
    }
}
