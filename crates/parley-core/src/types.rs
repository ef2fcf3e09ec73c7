// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Parley workspace.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque, client-held session token identifying one active conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The end customer.
    Customer,
    /// The automated assistant.
    Assistant,
    /// A human support agent.
    Agent,
}

/// Conversation lifecycle status.
///
/// `Resolved` is terminal: no further transitions or message appends are
/// permitted once a conversation reaches it, except the administrator's
/// closing message written before the transition commits.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    AiHandling,
    NeedsAttention,
    HumanHandling,
    Resolved,
}

impl ConversationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationStatus::Resolved)
    }
}

/// Who currently owns response responsibility for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Assignee {
    /// The automated assistant.
    Ai,
    /// A named human agent.
    Agent(String),
}

impl Assignee {
    /// True when a human agent is attending. While this holds, no
    /// assistant-authored message may be generated for the conversation.
    pub fn is_human(&self) -> bool {
        matches!(self, Assignee::Agent(_))
    }

    /// Storage column representation ("ai" or the agent id).
    pub fn to_column(&self) -> String {
        match self {
            Assignee::Ai => "ai".to_string(),
            Assignee::Agent(id) => id.clone(),
        }
    }

    /// Parse the storage column representation.
    pub fn from_column(s: &str) -> Self {
        if s == "ai" {
            Assignee::Ai
        } else {
            Assignee::Agent(s.to_string())
        }
    }
}

/// Sentiment classification of the latest customer message.
///
/// First-match-wins ordering is part of the contract: explicit human
/// requests outrank urgency, which outranks plain negativity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    /// The customer explicitly asked for a person.
    NeedsHuman,
    /// Urgency keywords detected.
    Urgent,
    /// Negative-sentiment keywords detected.
    Negative,
    Neutral,
}

/// Captured lead contact details. All three fields are required; partial
/// capture is rejected at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// One support interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    /// Unique among non-resolved conversations only. A resolved
    /// conversation's token is never resumed; the client is issued a fresh
    /// token and a new conversation instead.
    pub session_token: String,
    pub status: ConversationStatus,
    pub assignee: Assignee,
    pub requires_human: bool,
    /// Last computed sentiment classification, if any.
    pub sentiment: Option<Sentiment>,
    /// Free-form JSON context: originating page, viewed item, cart snapshot.
    pub context: Option<String>,
    pub lead: Option<LeadContact>,
    /// RFC 3339 UTC timestamps with millisecond precision.
    pub created_at: String,
    pub updated_at: String,
}

/// One unit of conversation content. Append-only: messages are never
/// mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender: Sender,
    pub body: String,
    /// Sender-dependent JSON blob (sentiment tag, confidence score, or
    /// intervention action). Opaque to the pipeline.
    pub metadata: Option<String>,
    pub created_at: String,
}

/// Why a conversation was escalated. Multiple simultaneous reasons are
/// preserved for the admin notification even though the status transition
/// is applied at most once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    ExplicitHumanRequest,
    UrgentSentiment,
    AssistantFlagged,
    LowConfidence,
    ConversationLength,
}

/// Ephemeral escalation decision, computed fresh on every customer message.
/// Never persisted as an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationVerdict {
    pub requires_human: bool,
    pub reasons: Vec<EscalationReason>,
}

impl EscalationVerdict {
    pub fn none() -> Self {
        Self {
            requires_human: false,
            reasons: Vec::new(),
        }
    }
}

/// One turn of the role-labeled transcript handed to the completion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: Sender,
    pub text: String,
}

/// Result of a completion engine call.
///
/// `confidence` is a heuristic derived from the reply text, not a
/// calibrated probability; it is meaningful only as an escalation trigger
/// within this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub text: String,
    pub flagged_for_human: bool,
    pub confidence: f64,
}

/// Events published to the real-time fan-out layer.
///
/// Delivery is at-least-once with no ordering guarantee; consumers must
/// dedupe on message id and re-sort by timestamp before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    MessageCreated { message: ChatMessage },
    ConversationUpdated {
        conversation_id: String,
        status: ConversationStatus,
        requires_human: bool,
        reasons: Vec<EscalationReason>,
    },
    ConversationResolved { conversation_id: String },
    LeadCaptured { conversation_id: String },
}

impl ChatEvent {
    /// Wire-level event name for the channel service.
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::MessageCreated { .. } => "message.created",
            ChatEvent::ConversationUpdated { .. } => "conversation.updated",
            ChatEvent::ConversationResolved { .. } => "conversation.resolved",
            ChatEvent::LeadCaptured { .. } => "lead.captured",
        }
    }

    /// Serialize the event payload for publishing.
    pub fn to_payload(&self) -> Result<String, crate::ParleyError> {
        serde_json::to_string(self)
            .map_err(|e| crate::ParleyError::Internal(format!("event serialization: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ConversationStatus::Active,
            ConversationStatus::AiHandling,
            ConversationStatus::NeedsAttention,
            ConversationStatus::HumanHandling,
            ConversationStatus::Resolved,
        ] {
            let s = status.to_string();
            let parsed = ConversationStatus::from_str(&s).expect("should parse back");
            assert_eq!(status, parsed);
        }
        assert_eq!(
            ConversationStatus::NeedsAttention.to_string(),
            "needs_attention"
        );
    }

    #[test]
    fn only_resolved_is_terminal() {
        assert!(ConversationStatus::Resolved.is_terminal());
        assert!(!ConversationStatus::HumanHandling.is_terminal());
    }

    #[test]
    fn assignee_column_round_trip() {
        assert_eq!(Assignee::from_column("ai"), Assignee::Ai);
        let agent = Assignee::Agent("agent-7".into());
        assert_eq!(Assignee::from_column(&agent.to_column()), agent);
        assert!(agent.is_human());
        assert!(!Assignee::Ai.is_human());
    }

    #[test]
    fn sender_wire_names_are_snake_case() {
        assert_eq!(Sender::Customer.to_string(), "customer");
        assert_eq!(Sender::Assistant.to_string(), "assistant");
        assert_eq!(Sender::Agent.to_string(), "agent");
    }

    #[test]
    fn chat_event_names_and_payloads() {
        let event = ChatEvent::ConversationResolved {
            conversation_id: "conv-1".into(),
        };
        assert_eq!(event.name(), "conversation.resolved");
        let payload = event.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["event"], "conversation_resolved");
        assert_eq!(value["conversation_id"], "conv-1");
    }

    #[test]
    fn verdict_none_has_no_reasons() {
        let verdict = EscalationVerdict::none();
        assert!(!verdict.requires_human);
        assert!(verdict.reasons.is_empty());
    }
}
