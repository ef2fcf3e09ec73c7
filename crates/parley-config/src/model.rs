// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley support engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Completion engine settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Session token settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Per-token rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Escalation engine thresholds.
    #[serde(default)]
    pub escalation: EscalationConfig,

    /// Administrative access settings.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Housekeeping (inactivity auto-resolve) settings.
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,

    /// Admin notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "parley.db".to_string()
}

/// Completion engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// Base URL of the completion engine endpoint.
    #[serde(default = "default_completion_url")]
    pub api_url: String,

    /// API key, if the engine requires one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upper bound on a single completion call before the fallback reply
    /// is substituted.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_url: default_completion_url(),
            api_key: None,
            timeout_secs: default_completion_timeout(),
        }
    }
}

fn default_completion_url() -> String {
    "http://127.0.0.1:9090/v1/complete".to_string()
}

fn default_completion_timeout() -> u64 {
    30
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Token time-to-live in seconds. Default: 2 hours.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> u64 {
    2 * 60 * 60
}

/// Sliding-window rate limit configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Maximum messages per window per session token.
    #[serde(default = "default_rate_limit_max")]
    pub max_messages: usize,

    /// Window length in seconds.
    #[serde(default = "default_rate_limit_window")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages: default_rate_limit_max(),
            window_secs: default_rate_limit_window(),
        }
    }
}

fn default_rate_limit_max() -> usize {
    10
}

fn default_rate_limit_window() -> u64 {
    60
}

/// Escalation engine thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EscalationConfig {
    /// Assistant confidence below this value forces a handoff.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Conversations with more than this many total messages force a
    /// handoff.
    #[serde(default = "default_max_messages")]
    pub max_conversation_messages: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_conversation_messages: default_max_messages(),
        }
    }
}

fn default_confidence_threshold() -> f64 {
    0.6
}

fn default_max_messages() -> usize {
    15
}

/// Administrative access configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Shared secret gating administrative operations. When unset, all
    /// administrative requests are rejected (fail-closed).
    #[serde(default)]
    pub secret: Option<String>,
}

/// Housekeeping configuration for inactivity auto-resolution.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HousekeepingConfig {
    /// Enable the periodic sweep.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Conversations in active/ai_handling with no message for this many
    /// seconds are resolved. Default: 30 minutes.
    #[serde(default = "default_idle_resolve")]
    pub idle_resolve_secs: u64,

    /// Interval between sweeps in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for HousekeepingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            idle_resolve_secs: default_idle_resolve(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_idle_resolve() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

/// Admin notification configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Webhook URL for escalation notifications. When unset, notifications
    /// are logged only.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_documented_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.rate_limit.max_messages, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.session.token_ttl_secs, 7200);
        assert_eq!(config.escalation.confidence_threshold, 0.6);
        assert_eq!(config.escalation.max_conversation_messages, 15);
        assert_eq!(config.housekeeping.idle_resolve_secs, 1800);
        assert!(config.admin.secret.is_none());
    }

    #[test]
    fn serializes_and_round_trips() {
        let config = ParleyConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: ParleyConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.storage.database_path, config.storage.database_path);
    }
}
