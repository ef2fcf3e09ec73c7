// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine error to HTTP response mapping.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use parley_core::ParleyError;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Map an engine error onto its HTTP status and body. Rate limit
/// violations additionally carry a `Retry-After` header.
pub fn error_response(err: ParleyError) -> Response {
    let (status, retry_after) = match &err {
        ParleyError::Validation(_) => (StatusCode::BAD_REQUEST, None),
        ParleyError::RateLimited { retry_after_secs } => {
            (StatusCode::TOO_MANY_REQUESTS, Some(*retry_after_secs))
        }
        ParleyError::Unauthorized => (StatusCode::UNAUTHORIZED, None),
        ParleyError::ConversationResolved { .. } => (StatusCode::GONE, None),
        ParleyError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, None),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, None),
    };
    let body = Json(ErrorResponse {
        error: err.to_string(),
        retry_after_secs: retry_after,
    });
    match retry_after {
        Some(secs) => (status, [(header::RETRY_AFTER, secs.to_string())], body).into_response(),
        None => (status, body).into_response(),
    }
}
