// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message intake pipeline: validate, reject terminal writes, persist.
//!
//! Every durable message from any sender passes through [`MessagePipeline::submit`].
//! Validation happens before any write, so a rejected message consumes
//! nothing.

use std::sync::Arc;

use parley_core::{
    now_rfc3339, ChatMessage, Conversation, ConversationStore, ParleyError, Sender,
    MAX_MESSAGE_LEN,
};

/// Trim and bound-check a message body. Returns the trimmed body.
pub fn validate_body(body: &str) -> Result<String, ParleyError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ParleyError::Validation("message body is empty".into()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_LEN {
        return Err(ParleyError::Validation(format!(
            "message body exceeds {MAX_MESSAGE_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Stateless intake pipeline over the conversation store.
#[derive(Clone)]
pub struct MessagePipeline {
    store: Arc<dyn ConversationStore>,
}

impl MessagePipeline {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    /// Validate and persist one message, touching the conversation's
    /// `updated_at`. Returns the canonical record with its persisted id
    /// and timestamp.
    pub async fn submit(
        &self,
        conversation: &Conversation,
        sender: Sender,
        body: &str,
        metadata: Option<String>,
    ) -> Result<ChatMessage, ParleyError> {
        let body = validate_body(body)?;
        if conversation.status.is_terminal() {
            return Err(ParleyError::ConversationResolved {
                conversation_id: conversation.id.clone(),
            });
        }

        let message = ChatMessage {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation.id.clone(),
            sender,
            body,
            metadata,
            created_at: now_rfc3339(),
        };
        self.store.append_message(&message).await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bodies_are_trimmed() {
        assert_eq!(validate_body("  hello \n").unwrap(), "hello");
    }

    #[test]
    fn empty_and_whitespace_bodies_are_rejected() {
        assert!(matches!(validate_body(""), Err(ParleyError::Validation(_))));
        assert!(matches!(validate_body("   \n\t "), Err(ParleyError::Validation(_))));
    }

    #[test]
    fn length_limit_counts_characters_after_trimming() {
        let exactly = "x".repeat(MAX_MESSAGE_LEN);
        assert!(validate_body(&exactly).is_ok());
        // Surrounding whitespace does not count against the limit.
        assert!(validate_body(&format!("  {exactly}  ")).is_ok());

        let over = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(validate_body(&over), Err(ParleyError::Validation(_))));
    }

    #[test]
    fn length_limit_is_in_characters_not_bytes() {
        // Multibyte characters: 2000 of these is 6000 bytes but still valid.
        let wide = "\u{00e9}".repeat(MAX_MESSAGE_LEN);
        assert!(validate_body(&wide).is_ok());
    }
}
