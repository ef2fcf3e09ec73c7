// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent store trait for conversations and messages.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{
    Assignee, ChatMessage, Conversation, ConversationStatus, LeadContact, Sentiment,
};

/// Adapter for the durable conversation/message store.
///
/// The Conversation row is the unit of transactional mutation; two
/// concurrent customer messages on the same conversation serialize at the
/// store level. Messages are append-only and totally ordered by
/// persistence sequence within a conversation.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), ParleyError>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, ParleyError>;

    /// Look up the conversation owning `token`, considering non-resolved
    /// conversations only. A resolved conversation's token is dead and must
    /// never match.
    async fn find_by_token(&self, token: &str) -> Result<Option<Conversation>, ParleyError>;

    async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ParleyError>;

    /// Update status, assignment, and the requires-human flag in one write,
    /// touching `updated_at`.
    async fn update_status(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
    ) -> Result<(), ParleyError>;

    async fn set_sentiment(&self, id: &str, sentiment: Sentiment) -> Result<(), ParleyError>;

    /// Store captured lead contact details in their dedicated columns.
    async fn set_lead(&self, id: &str, lead: &LeadContact) -> Result<(), ParleyError>;

    /// Append a message and touch the owning conversation's `updated_at`
    /// atomically.
    async fn append_message(&self, message: &ChatMessage) -> Result<(), ParleyError>;

    /// Messages for a conversation in persistence order (chronological,
    /// insertion order breaking timestamp ties).
    async fn messages_for(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParleyError>;

    /// Apply an administrative intervention as a single transaction: the
    /// optional message is written first, then the status flips. Either
    /// both commit or neither does.
    async fn apply_intervention(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
        message: Option<&ChatMessage>,
    ) -> Result<(), ParleyError>;

    /// Conversations in any of `statuses` whose `updated_at` is strictly
    /// older than `cutoff` (RFC 3339). Used by the housekeeping sweep.
    async fn stale_conversations(
        &self,
        statuses: &[ConversationStatus],
        cutoff: &str,
    ) -> Result<Vec<Conversation>, ParleyError>;
}
