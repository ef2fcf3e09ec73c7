// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley live-support engine.
//!
//! This crate provides the domain types, error taxonomy, and collaborator
//! trait definitions used throughout the Parley workspace. The persistent
//! store, completion engine, real-time channel service, and notification
//! service are all consumed through traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ParleyError;
pub use types::{
    Assignee, ChatEvent, ChatMessage, CompletionOutcome, Conversation, ConversationStatus,
    EscalationReason, EscalationVerdict, LeadContact, Sender, Sentiment, SessionToken,
    TranscriptTurn,
};

pub use traits::{CompletionEngine, ConversationStore, Notifier, RealtimeChannel};

/// Maximum message body length after trimming, in characters.
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Current UTC timestamp in the workspace-wide storage format
/// (RFC 3339 with millisecond precision).
pub fn now_rfc3339() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
