// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine for the Parley live-support service.
//!
//! Ties the collaborators together: the message pipeline validates and
//! persists, the escalation engine decides when a human is required, the
//! state machine owns every status change, and the chat/admin services
//! orchestrate the customer and administrator paths. The housekeeping
//! sweep resolves idle unattended conversations.

pub mod admin;
pub mod chat;
pub mod escalation;
pub mod fanout;
pub mod housekeeping;
pub mod notify;
pub mod pipeline;
pub mod state;

pub use admin::{AdminAction, AdminService, InterventionOutcome};
pub use chat::{ChatService, CustomerReply, SessionStart, FALLBACK_REPLY};
pub use escalation::{classify_sentiment, decide, EscalationInput};
pub use housekeeping::Housekeeper;
pub use notify::{LogNotifier, WebhookNotifier};
pub use pipeline::{validate_body, MessagePipeline};
pub use state::{transition, StatusEvent, Transition, TransitionRejected};
