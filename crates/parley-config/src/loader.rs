// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./parley.toml` > `~/.config/parley/parley.toml`
//! > `/etc/parley/parley.toml`, with environment variable overrides via the
//! `PARLEY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ParleyConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/parley/parley.toml` (system-wide)
/// 3. `~/.config/parley/parley.toml` (user XDG config)
/// 4. `./parley.toml` (local directory)
/// 5. `PARLEY_*` environment variables
pub fn load_config() -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file("/etc/parley/parley.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("parley/parley.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("parley.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ParleyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ParleyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PARLEY_RATE_LIMIT_MAX_MESSAGES` must
/// map to `rate_limit.max_messages`, not `rate.limit.max.messages`.
fn env_provider() -> Env {
    Env::prefixed("PARLEY_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("completion_", "completion.", 1)
            .replacen("session_", "session.", 1)
            .replacen("rate_limit_", "rate_limit.", 1)
            .replacen("escalation_", "escalation.", 1)
            .replacen("admin_", "admin.", 1)
            .replacen("housekeeping_", "housekeeping.", 1)
            .replacen("notify_", "notify.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_str_applies_overrides() {
        let config = load_config_from_str(
            r#"
            [server]
            port = 9999

            [rate_limit]
            max_messages = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.rate_limit.max_messages, 3);
        // Untouched sections keep their defaults.
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.session.token_ttl_secs, 7200);
    }

    #[test]
    fn load_from_str_rejects_unknown_keys() {
        let result = load_config_from_str(
            r#"
            [server]
            prot = 9999
            "#,
        );
        assert!(result.is_err(), "unknown key should be rejected");
    }

    #[test]
    fn env_mapping_preserves_underscored_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PARLEY_RATE_LIMIT_MAX_MESSAGES", "4");
            jail.set_env("PARLEY_ADMIN_SECRET", "a-long-shared-secret");
            let config: ParleyConfig = Figment::new()
                .merge(Serialized::defaults(ParleyConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.rate_limit.max_messages, 4);
            assert_eq!(config.admin.secret.as_deref(), Some("a-long-shared-secret"));
            Ok(())
        });
    }
}
