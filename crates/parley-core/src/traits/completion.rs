// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion engine trait.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{CompletionOutcome, TranscriptTurn};

/// Narrow request/response contract over the natural-language completion
/// engine: given an ordered, role-labeled message history and free-text
/// context, return a reply plus self-reported escalation signals.
///
/// The call is the dominant latency source of the request path; callers
/// bound it with a timeout and fall back to a fixed apologetic message.
#[async_trait]
pub trait CompletionEngine: Send + Sync {
    async fn complete(
        &self,
        history: &[TranscriptTurn],
        context: Option<&str>,
    ) -> Result<CompletionOutcome, ParleyError>;
}
