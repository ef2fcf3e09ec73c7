// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Escalation triggers.
//!
//! Sentiment classification is keyword-driven and first-match-wins:
//! explicit human requests outrank urgency, which outranks plain
//! negativity. The verdict accumulates every reason that fired so the
//! admin notification can report all of them, even though the status
//! transition itself applies at most once.

use parley_config::model::EscalationConfig;
use parley_core::{EscalationReason, EscalationVerdict, Sentiment};

/// Phrases that count as an explicit request for a person.
const HUMAN_REQUEST_MARKERS: &[&str] = &[
    "speak to a human",
    "talk to a human",
    "speak to a person",
    "talk to a person",
    "speak to someone",
    "talk to someone",
    "real person",
    "real human",
    "human agent",
    "live agent",
    "customer service representative",
    "speak with an agent",
    "talk to an agent",
];

const URGENCY_MARKERS: &[&str] = &[
    "urgent",
    "emergency",
    "immediately",
    "right now",
    "asap",
    "critical",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "angry",
    "furious",
    "terrible",
    "awful",
    "horrible",
    "worst",
    "unacceptable",
    "frustrated",
    "disappointed",
    "ridiculous",
    "useless",
];

/// Classify the latest customer message. Matching is case-insensitive
/// substring search over the whole body.
pub fn classify_sentiment(body: &str) -> Sentiment {
    let lowered = body.to_lowercase();
    let contains_any = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if contains_any(HUMAN_REQUEST_MARKERS) {
        Sentiment::NeedsHuman
    } else if contains_any(URGENCY_MARKERS) {
        Sentiment::Urgent
    } else if contains_any(NEGATIVE_MARKERS) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Inputs to one escalation decision. All fields describe the current
/// turn; nothing here is read back from storage.
#[derive(Debug, Clone)]
pub struct EscalationInput {
    pub sentiment: Sentiment,
    /// The completion engine flagged its own reply for handoff.
    pub assistant_flagged: bool,
    /// Heuristic confidence of the assistant reply; 1.0 when no reply was
    /// generated this turn.
    pub confidence: f64,
    /// Total persisted messages in the conversation, all senders.
    pub message_count: usize,
}

/// Evaluate every trigger and accumulate the reasons that fired.
///
/// Plain negative sentiment alone does not escalate; it is recorded on the
/// conversation for the admin view but keeps the assistant in charge.
pub fn decide(input: &EscalationInput, config: &EscalationConfig) -> EscalationVerdict {
    let mut reasons = Vec::new();

    match input.sentiment {
        Sentiment::NeedsHuman => reasons.push(EscalationReason::ExplicitHumanRequest),
        Sentiment::Urgent => reasons.push(EscalationReason::UrgentSentiment),
        Sentiment::Negative | Sentiment::Neutral => {}
    }
    if input.assistant_flagged {
        reasons.push(EscalationReason::AssistantFlagged);
    }
    if input.confidence < config.confidence_threshold {
        reasons.push(EscalationReason::LowConfidence);
    }
    if input.message_count > config.max_conversation_messages {
        reasons.push(EscalationReason::ConversationLength);
    }

    EscalationVerdict {
        requires_human: !reasons.is_empty(),
        reasons,
    }
}
