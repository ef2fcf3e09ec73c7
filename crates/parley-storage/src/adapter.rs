// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ConversationStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parley_config::model::StorageConfig;
use parley_core::types::{
    Assignee, ChatMessage, Conversation, ConversationStatus, LeadContact, Sentiment,
};
use parley_core::{ConversationStore, ParleyError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed conversation store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`SqliteStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new store with the given configuration. The connection is
    /// not opened until [`initialize`](Self::initialize) is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Open the database and run migrations.
    pub async fn initialize(&self) -> Result<(), ParleyError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| ParleyError::Store {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite store initialized");
        Ok(())
    }

    /// Checkpoint the WAL and release the connection.
    pub async fn close(&self) -> Result<(), ParleyError> {
        self.db()?.close().await
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Store {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), ParleyError> {
        queries::conversations::create_conversation(self.db()?, conversation).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, ParleyError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Conversation>, ParleyError> {
        queries::conversations::find_by_token(self.db()?, token).await
    }

    async fn list_conversations(
        &self,
        status: Option<ConversationStatus>,
    ) -> Result<Vec<Conversation>, ParleyError> {
        queries::conversations::list_conversations(self.db()?, status).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
    ) -> Result<(), ParleyError> {
        queries::conversations::update_status(self.db()?, id, status, assignee, requires_human)
            .await
    }

    async fn set_sentiment(&self, id: &str, sentiment: Sentiment) -> Result<(), ParleyError> {
        queries::conversations::set_sentiment(self.db()?, id, sentiment).await
    }

    async fn set_lead(&self, id: &str, lead: &LeadContact) -> Result<(), ParleyError> {
        queries::conversations::set_lead(self.db()?, id, lead).await
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), ParleyError> {
        queries::messages::append_message(self.db()?, message).await
    }

    async fn messages_for(
        &self,
        conversation_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ParleyError> {
        queries::messages::messages_for(self.db()?, conversation_id, limit).await
    }

    async fn apply_intervention(
        &self,
        id: &str,
        status: ConversationStatus,
        assignee: &Assignee,
        requires_human: bool,
        message: Option<&ChatMessage>,
    ) -> Result<(), ParleyError> {
        queries::conversations::apply_intervention(
            self.db()?,
            id,
            status,
            assignee,
            requires_human,
            message,
        )
        .await
    }

    async fn stale_conversations(
        &self,
        statuses: &[ConversationStatus],
        cutoff: &str,
    ) -> Result<Vec<Conversation>, ParleyError> {
        queries::conversations::stale_conversations(self.db()?, statuses, cutoff).await
    }
}
