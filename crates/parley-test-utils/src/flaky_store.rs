// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper with a switchable outage, for degraded-mode testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use parley_core::{
    Assignee, ChatMessage, Conversation, ConversationStatus, ConversationStore, LeadContact,
    ParleyError, Sentiment,
};

/// Delegates to an inner store until [`FlakyStore::set_down`] flips the
/// outage switch, after which every call fails with a storage error.
pub struct FlakyStore {
    inner: Arc<dyn ConversationStore>,
    down: AtomicBool,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn ConversationStore>) -> Self {
        Self {
            inner,
            down: AtomicBool::new(false),
        }
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ParleyError> {
        if self.down.load(Ordering::SeqCst) {
            Err(ParleyError::Store {
                source: Box::new(std::io::Error::other("simulated store outage")),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConversationStore for FlakyStore {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), ParleyError> {
        self.check()?;
        self.inner.create_conversation(conversation).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, ParleyError> {
        self.check()?;
        self.inner.get_conversation(id).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Conversation>, ParleyError> {
        self.check()?;
        self.inner.find_by_token(token).await
    }

    async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ParleyError> {
        self.check()?;
        self.inner.list_conversations(status).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
    ) -> Result<(), ParleyError> {
        self.check()?;
        self.inner
            .update_status(id, status, assignee, requires_human)
            .await
    }

    async fn set_sentiment(&self, id: &str, sentiment: Sentiment) -> Result<(), ParleyError> {
        self.check()?;
        self.inner.set_sentiment(id, sentiment).await
    }

    async fn set_lead(&self, id: &str, lead: &LeadContact) -> Result<(), ParleyError> {
        self.check()?;
        self.inner.set_lead(id, lead).await
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), ParleyError> {
        self.check()?;
        self.inner.append_message(message).await
    }

    async fn messages_for(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParleyError> {
        self.check()?;
        self.inner.messages_for(conversation_id, limit).await
    }

    async fn apply_intervention(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
        message: Option<&ChatMessage>,
    ) -> Result<(), ParleyError> {
        self.check()?;
        self.inner
            .apply_intervention(id, status, assignee, requires_human, message)
            .await
    }

    async fn stale_conversations(
        &self,
        statuses: &[ConversationStatus],
        cutoff: &str,
    ) -> Result<Vec<Conversation>, ParleyError> {
        self.check()?;
        self.inner.stale_conversations(statuses, cutoff).await
    }
}
