// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative authentication.
//!
//! Admin routes are gated by a shared secret sent in the `X-Admin-Secret`
//! header (or the `secret` query parameter for the WebSocket handshake).
//! Comparison is constant-time. When no secret is configured, all
//! administrative requests are rejected (fail-closed).

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

/// Header carrying the administrative secret.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Administrative auth configuration.
#[derive(Clone)]
pub struct AuthConfig {
    secret: Option<String>,
}

impl AuthConfig {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// Constant-time verification of a provided secret. Always false when
    /// no secret is configured.
    pub fn verify(&self, provided: &str) -> bool {
        match &self.secret {
            Some(expected) => ring::constant_time::verify_slices_are_equal(
                expected.as_bytes(),
                provided.as_bytes(),
            )
            .is_ok(),
            None => false,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Middleware gating the admin route group.
pub async fn admin_auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !auth.is_configured() {
        tracing::error!("no admin secret configured -- rejecting administrative request");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let provided = request
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    match provided {
        Some(secret) if auth.verify(secret) => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_auth_rejects_everything() {
        let auth = AuthConfig::new(None);
        assert!(!auth.is_configured());
        assert!(!auth.verify("anything"));
    }

    #[test]
    fn verify_accepts_exact_match_only() {
        let auth = AuthConfig::new(Some("a-long-shared-secret".into()));
        assert!(auth.verify("a-long-shared-secret"));
        assert!(!auth.verify("a-long-shared-secreT"));
        assert!(!auth.verify(""));
        assert!(!auth.verify("a-long-shared-secret-but-longer"));
    }

    #[test]
    fn debug_redacts_secret() {
        let auth = AuthConfig::new(Some("hunter2hunter2hunter2".into()));
        let debug = format!("{auth:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
