// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification collaborator trait.

use async_trait::async_trait;

use crate::error::ParleyError;

/// Fire-and-forget notification service (email/SMS to the support team).
///
/// Failures must never block or fail the request path; the engine spawns
/// notifications and logs errors at `warn`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<(), ParleyError>;
}
