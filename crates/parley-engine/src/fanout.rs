// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast helpers.
//!
//! Every durable write fans out to the conversation's private channel and
//! the shared admin channel. Publish failures are logged and swallowed;
//! they never fail the write that triggered them.

use std::sync::Arc;

use tracing::warn;

use parley_core::{ChatEvent, RealtimeChannel};
use parley_realtime::{conversation_channel, ADMIN_CHANNEL};

/// Publish `event` to the conversation channel for `session_token` and to
/// the admin channel.
pub async fn broadcast(
    realtime: &Arc<dyn RealtimeChannel>,
    session_token: &str,
    event: &ChatEvent,
) {
    let payload = match event.to_payload() {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, event = event.name(), "event serialization failed, skipping broadcast");
            return;
        }
    };
    for channel in [conversation_channel(session_token), ADMIN_CHANNEL.to_string()] {
        if let Err(e) = realtime.publish(&channel, event.name(), &payload).await {
            warn!(error = %e, %channel, event = event.name(), "broadcast failed");
        }
    }
}
