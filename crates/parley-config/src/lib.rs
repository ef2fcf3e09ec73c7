// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Parley support engine.
//!
//! Layered TOML loading (defaults, system, XDG, local) with `PARLEY_*`
//! environment overrides, plus startup validation of cross-field
//! constraints the serde model cannot express.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ParleyConfig;

use parley_core::ParleyError;

/// Load configuration and validate it, converting figment errors into the
/// workspace error type.
pub fn load_and_validate() -> Result<ParleyConfig, ParleyError> {
    let config = load_config().map_err(|e| ParleyError::Config(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Validate constraints the serde model cannot express.
pub fn validate(config: &ParleyConfig) -> Result<(), ParleyError> {
    if config.rate_limit.max_messages == 0 {
        return Err(ParleyError::Config(
            "rate_limit.max_messages must be at least 1".into(),
        ));
    }
    if config.rate_limit.window_secs == 0 {
        return Err(ParleyError::Config(
            "rate_limit.window_secs must be at least 1".into(),
        ));
    }
    if !(0.0..=1.0).contains(&config.escalation.confidence_threshold) {
        return Err(ParleyError::Config(format!(
            "escalation.confidence_threshold must be in [0, 1], got {}",
            config.escalation.confidence_threshold
        )));
    }
    if let Some(secret) = &config.admin.secret {
        if secret.len() < 16 {
            return Err(ParleyError::Config(
                "admin.secret must be at least 16 characters".into(),
            ));
        }
    }
    if config.completion.timeout_secs == 0 {
        return Err(ParleyError::Config(
            "completion.timeout_secs must be at least 1".into(),
        ));
    }
    Ok(())
}
