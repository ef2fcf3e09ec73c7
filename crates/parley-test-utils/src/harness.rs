// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! Assembles the full engine over a temp SQLite database, the mock
//! completion engine, an in-process broker, and a log-only notifier.
//! Tests are isolated and order-insensitive; every harness owns its own
//! database.

use std::sync::Arc;

use tempfile::TempDir;

use parley_config::model::{ParleyConfig, StorageConfig};
use parley_core::{CompletionEngine, CompletionOutcome, ConversationStore, ParleyError};
use parley_engine::{AdminService, ChatService, Housekeeper, LogNotifier};
use parley_realtime::InProcessBroker;
use parley_session::{InMemoryRateLimitStore, RateLimiter};
use parley_storage::SqliteStore;

use crate::flaky_store::FlakyStore;
use crate::mock_completion::MockCompletion;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    outcomes: Vec<CompletionOutcome>,
    slow_completion: Option<std::time::Duration>,
    config: ParleyConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ParleyConfig::default();
        // Keep timeout-path tests fast.
        config.completion.timeout_secs = 1;
        Self {
            outcomes: Vec::new(),
            slow_completion: None,
            config,
        }
    }

    /// Pre-load mock completion outcomes.
    pub fn with_outcomes(mut self, outcomes: Vec<CompletionOutcome>) -> Self {
        self.outcomes = outcomes;
        self
    }

    /// Make every completion call sleep for `delay`.
    pub fn with_slow_completion(mut self, delay: std::time::Duration) -> Self {
        self.slow_completion = Some(delay);
        self
    }

    /// Adjust configuration before the stack is built.
    pub fn with_config(mut self, mutate: impl FnOnce(&mut ParleyConfig)) -> Self {
        mutate(&mut self.config);
        self
    }

    /// Build the harness, creating all subsystems over a temp database.
    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let temp_dir = TempDir::new().map_err(|e| ParleyError::Store { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let sqlite = SqliteStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        });
        sqlite.initialize().await?;
        let flaky = Arc::new(FlakyStore::new(Arc::new(sqlite)));
        let store: Arc<dyn ConversationStore> = flaky.clone();

        let completion = Arc::new(match self.slow_completion {
            Some(delay) => MockCompletion::with_delay(delay),
            None => MockCompletion::with_outcomes(self.outcomes),
        });
        let completion_engine: Arc<dyn CompletionEngine> = completion.clone();

        let broker = Arc::new(InProcessBroker::default());
        let limiter = Arc::new(RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            &self.config.rate_limit,
        ));

        let chat = Arc::new(ChatService::new(
            Arc::clone(&store),
            completion_engine,
            broker.clone(),
            Arc::new(LogNotifier),
            limiter,
            &self.config,
        ));
        let admin = Arc::new(AdminService::new(Arc::clone(&store), broker.clone()));
        let housekeeper = Arc::new(Housekeeper::new(
            Arc::clone(&store),
            broker.clone(),
            self.config.housekeeping.clone(),
        ));

        Ok(TestHarness {
            chat,
            admin,
            housekeeper,
            store,
            flaky,
            completion,
            broker,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired engine over isolated temp storage.
pub struct TestHarness {
    pub chat: Arc<ChatService>,
    pub admin: Arc<AdminService>,
    pub housekeeper: Arc<Housekeeper>,
    pub store: Arc<dyn ConversationStore>,
    /// Outage switch for degraded-mode tests.
    pub flaky: Arc<FlakyStore>,
    pub completion: Arc<MockCompletion>,
    pub broker: Arc<InProcessBroker>,
    pub config: ParleyConfig,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn harness_builds_and_serves_a_turn() {
        let harness = TestHarness::builder()
            .with_outcomes(vec![MockCompletion::reply("hi!")])
            .build()
            .await
            .unwrap();
        let start = harness.chat.start_session(None, None).await.unwrap();
        let ack = harness
            .chat
            .handle_customer_message(start.token.as_str(), "hello")
            .await
            .unwrap();
        assert_eq!(ack.reply_text.as_deref(), Some("hi!"));
    }
}
