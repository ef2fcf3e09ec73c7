// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation status transition rules.
//!
//! All status changes in the engine funnel through [`transition`]; nothing
//! else is allowed to compute a next status. The function is pure so every
//! edge of the graph is unit-testable without a store.

use parley_core::ConversationStatus;

/// Cause of a prospective status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The escalation engine decided a human is required.
    EscalationRequired,
    /// An administrator claimed the conversation.
    TakeOver,
    /// An administrator replied without an explicit take-over; replying
    /// implies attending.
    AgentReply,
    /// An administrator returned the conversation to the assistant.
    HandBack,
    /// An administrator closed the conversation.
    Resolve,
    /// The housekeeping sweep closed an idle conversation.
    InactivityTimeout,
    /// The assistant produced a reply on an unescalated conversation.
    AssistantReplied,
}

impl StatusEvent {
    fn name(&self) -> &'static str {
        match self {
            StatusEvent::EscalationRequired => "escalation_required",
            StatusEvent::TakeOver => "take_over",
            StatusEvent::AgentReply => "agent_reply",
            StatusEvent::HandBack => "hand_back",
            StatusEvent::Resolve => "resolve",
            StatusEvent::InactivityTimeout => "inactivity_timeout",
            StatusEvent::AssistantReplied => "assistant_replied",
        }
    }
}

/// Accepted transition. `changed` is false for idempotent re-application
/// (e.g. escalating an already-escalated conversation), in which case no
/// status write should be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ConversationStatus,
    pub changed: bool,
}

/// Rejected transition: the event is not legal from the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRejected {
    pub current: ConversationStatus,
    pub event: String,
}

impl std::fmt::Display for TransitionRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event {} not permitted from status {}", self.event, self.current)
    }
}

/// Compute the next status for `event` applied at `current`.
///
/// `Resolved` is terminal: every event is rejected from it. Escalation is
/// idempotent rather than an error, and is a no-op while a human already
/// attends.
pub fn transition(
    current: ConversationStatus,
    event: &StatusEvent,
) -> Result<Transition, TransitionRejected> {
    use ConversationStatus::*;

    let reject = || {
        Err(TransitionRejected {
            current,
            event: event.name().to_string(),
        })
    };
    let to = |next: ConversationStatus| {
        Ok(Transition {
            next,
            changed: next != current,
        })
    };

    if current == Resolved {
        return reject();
    }

    match event {
        StatusEvent::EscalationRequired => match current {
            Active | AiHandling | NeedsAttention => to(NeedsAttention),
            // A human already attends; record nothing, change nothing.
            HumanHandling => to(HumanHandling),
            Resolved => unreachable!(),
        },
        StatusEvent::TakeOver | StatusEvent::AgentReply => to(HumanHandling),
        StatusEvent::HandBack => match current {
            HumanHandling => to(AiHandling),
            _ => reject(),
        },
        StatusEvent::Resolve => to(Resolved),
        StatusEvent::InactivityTimeout => match current {
            // Only unattended conversations may be swept; anything a human
            // touched stays open until an administrator closes it.
            Active | AiHandling => to(Resolved),
            _ => reject(),
        },
        StatusEvent::AssistantReplied => match current {
            Active | AiHandling => to(AiHandling),
            // The reply was generated alongside an escalation; keep the
            // escalated status.
            NeedsAttention => to(NeedsAttention),
            HumanHandling => reject(),
            Resolved => unreachable!(),
        },
    }
}
