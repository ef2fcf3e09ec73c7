// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time channel service trait.

use async_trait::async_trait;

use crate::error::ParleyError;

/// Publish-side contract of the real-time channel service.
///
/// Delivery is at-least-once and unordered: subscribers may observe
/// duplicates and out-of-order arrival, and must be idempotent on message
/// id. Publish failures never fail the primary write; callers log and
/// swallow them.
#[async_trait]
pub trait RealtimeChannel: Send + Sync {
    async fn publish(&self, channel: &str, event: &str, payload: &str)
        -> Result<(), ParleyError>;
}
