// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative interventions.
//!
//! Take-over, agent reply, hand-back, and resolve. Each intervention is
//! applied as one store transaction: the optional agent message commits
//! together with the status flip or not at all. Authentication happens at
//! the gateway; this service assumes the caller is already authorized.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use parley_core::{
    now_rfc3339, Assignee, ChatEvent, ChatMessage, Conversation, ConversationStatus,
    ConversationStore, ParleyError, RealtimeChannel, Sender,
};

use crate::fanout::broadcast;
use crate::pipeline::validate_body;
use crate::state::{transition, StatusEvent, Transition};

/// One administrative action against a conversation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminAction {
    /// Claim the conversation, optionally with an opening message.
    TakeOver {
        agent_id: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Reply as the agent; replying implies attending.
    SendMessage { agent_id: String, body: String },
    /// Return the conversation to the assistant.
    HandBack,
    /// Close the conversation, optionally with a closing message written
    /// before the terminal transition commits.
    Resolve {
        #[serde(default)]
        agent_id: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

/// Conversation state after an intervention.
#[derive(Debug)]
pub struct InterventionOutcome {
    pub conversation: Conversation,
    /// The agent message written as part of the intervention, if any.
    pub message: Option<ChatMessage>,
}

/// Admin-facing service over the conversation store.
pub struct AdminService {
    store: Arc<dyn ConversationStore>,
    realtime: Arc<dyn RealtimeChannel>,
}

impl AdminService {
    pub fn new(store: Arc<dyn ConversationStore>, realtime: Arc<dyn RealtimeChannel>) -> Self {
        Self { store, realtime }
    }

    /// All conversations, optionally filtered by status, most recently
    /// updated first.
    pub async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ParleyError> {
        self.store.list_conversations(status).await
    }

    /// One conversation with its full transcript.
    pub async fn conversation_detail(
        &self,
        id: &str,
    ) -> Result<(Conversation, Vec<ChatMessage>), ParleyError> {
        let conversation = self
            .store
            .get_conversation(id)
            .await?
            .ok_or_else(|| ParleyError::Validation(format!("unknown conversation {id}")))?;
        let messages = self.store.messages_for(id, None).await?;
        Ok((conversation, messages))
    }

    /// Apply one intervention atomically and fan out the resulting events.
    pub async fn intervene(
        &self,
        id: &str,
        action: AdminAction,
    ) -> Result<InterventionOutcome, ParleyError> {
        let conversation = self
            .store
            .get_conversation(id)
            .await?
            .ok_or_else(|| ParleyError::Validation(format!("unknown conversation {id}")))?;
        if conversation.status.is_terminal() {
            return Err(ParleyError::ConversationResolved {
                conversation_id: conversation.id.clone(),
            });
        }

        let (event, assignee, requires_human, message_body, agent_id) = match &action {
            AdminAction::TakeOver { agent_id, message } => (
                StatusEvent::TakeOver,
                Assignee::Agent(agent_id.clone()),
                false,
                message.clone(),
                Some(agent_id.clone()),
            ),
            AdminAction::SendMessage { agent_id, body } => (
                StatusEvent::AgentReply,
                Assignee::Agent(agent_id.clone()),
                false,
                Some(body.clone()),
                Some(agent_id.clone()),
            ),
            AdminAction::HandBack => (StatusEvent::HandBack, Assignee::Ai, false, None, None),
            AdminAction::Resolve { agent_id, message } => (
                StatusEvent::Resolve,
                conversation.assignee.clone(),
                false,
                message.clone(),
                agent_id.clone(),
            ),
        };

        let Transition { next, changed } = transition(conversation.status, &event)
            .map_err(|rejected| ParleyError::Validation(rejected.to_string()))?;

        let message = match message_body {
            Some(body) => {
                let body = validate_body(&body)?;
                let metadata = agent_id
                    .as_deref()
                    .map(|a| serde_json::json!({ "agent_id": a }).to_string());
                Some(ChatMessage {
                    id: uuid::Uuid::new_v4().to_string(),
                    conversation_id: conversation.id.clone(),
                    sender: Sender::Agent,
                    body,
                    metadata,
                    created_at: now_rfc3339(),
                })
            }
            None => None,
        };

        self.store
            .apply_intervention(id, next, &assignee, requires_human, message.as_ref())
            .await?;
        info!(conversation_id = %id, status = %next, "intervention applied");

        if let Some(message) = &message {
            broadcast(
                &self.realtime,
                &conversation.session_token,
                &ChatEvent::MessageCreated {
                    message: message.clone(),
                },
            )
            .await;
        }
        let state_event = if next == ConversationStatus::Resolved {
            ChatEvent::ConversationResolved {
                conversation_id: conversation.id.clone(),
            }
        } else {
            ChatEvent::ConversationUpdated {
                conversation_id: conversation.id.clone(),
                status: next,
                requires_human,
                reasons: Vec::new(),
            }
        };
        if changed || message.is_some() {
            broadcast(&self.realtime, &conversation.session_token, &state_event).await;
        }

        let updated = self.store.get_conversation(id).await?.ok_or_else(|| {
            warn!(conversation_id = %id, "conversation vanished after intervention");
            ParleyError::Internal("conversation missing after intervention".into())
        })?;
        Ok(InterventionOutcome {
            conversation: updated,
            message,
        })
    }
}
