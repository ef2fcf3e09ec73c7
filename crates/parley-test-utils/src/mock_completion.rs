// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion engine for deterministic testing.
//!
//! Outcomes are popped from a FIFO queue; when it runs dry a default
//! confident reply is returned. An optional artificial delay exercises
//! the caller's timeout handling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::{CompletionEngine, CompletionOutcome, ParleyError, TranscriptTurn};

/// A mock completion engine with pre-configured outcomes.
pub struct MockCompletion {
    outcomes: Mutex<VecDeque<Result<CompletionOutcome, ParleyError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Pre-load successful outcomes.
    pub fn with_outcomes(outcomes: Vec<CompletionOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().map(Ok).collect()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// A mock that sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    /// Queue an outcome (success or failure) at the back.
    pub async fn push(&self, outcome: Result<CompletionOutcome, ParleyError>) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Convenience constructor for a confident reply.
    pub fn reply(text: &str) -> CompletionOutcome {
        CompletionOutcome {
            text: text.to_string(),
            flagged_for_human: false,
            confidence: 0.9,
        }
    }

    /// Convenience constructor for an uncertain reply below the default
    /// escalation threshold.
    pub fn uncertain(text: &str) -> CompletionOutcome {
        CompletionOutcome {
            text: text.to_string(),
            flagged_for_human: false,
            confidence: 0.3,
        }
    }

    /// Number of completion calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionEngine for MockCompletion {
    async fn complete(
        &self,
        _history: &[TranscriptTurn],
        _context: Option<&str>,
    ) -> Result<CompletionOutcome, ParleyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.outcomes.lock().await.pop_front() {
            Some(outcome) => outcome,
            None => Ok(Self::reply("mock reply")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn outcomes_pop_in_order_then_default() {
        let mock = MockCompletion::with_outcomes(vec![MockCompletion::reply("first")]);
        let first = mock.complete(&[], None).await.unwrap();
        assert_eq!(first.text, "first");
        let fallback = mock.complete(&[], None).await.unwrap();
        assert_eq!(fallback.text, "mock reply");
        assert_eq!(mock.calls(), 2);
    }
}
