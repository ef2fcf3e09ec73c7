// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel naming convention.
//!
//! Every state change and message is published twice: to the private
//! per-conversation channel (named by session token, which only the owning
//! client knows) and to the shared administrative channel.

/// Shared channel all administrative dashboards subscribe to.
pub const ADMIN_CHANNEL: &str = "support-admin";

/// Private channel for one conversation, derived from its session token.
pub fn conversation_channel(session_token: &str) -> String {
    format!("chat-{session_token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_channel_uses_token() {
        assert_eq!(conversation_channel("abc123"), "chat-abc123");
    }
}
