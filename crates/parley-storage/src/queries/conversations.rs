// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD and intervention transactions.

use parley_core::types::{
    Assignee, ChatMessage, Conversation, ConversationStatus, LeadContact, Sentiment,
};
use parley_core::{now_rfc3339, ParleyError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::queries::{row_to_conversation, CONVERSATION_COLUMNS};

/// Create a new conversation. Fails if a non-resolved conversation already
/// holds the same session token (partial unique index).
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), ParleyError> {
    let c = conversation.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations
                 (id, session_token, status, assigned_to, requires_human, sentiment,
                  context, lead_name, lead_email, lead_phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    c.id,
                    c.session_token,
                    c.status.to_string(),
                    c.assignee.to_column(),
                    c.requires_human,
                    c.sentiment.map(|s| s.to_string()),
                    c.context,
                    c.lead.as_ref().map(|l| l.name.clone()),
                    c.lead.as_ref().map(|l| l.email.clone()),
                    c.lead.as_ref().map(|l| l.phone.clone()),
                    c.created_at,
                    c.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a conversation by ID.
pub async fn get_conversation(
    db: &Database,
    id: &str,
) -> Result<Option<Conversation>, ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let result = stmt.query_row(params![id], row_to_conversation);
            match result {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Find the live conversation owning `token`. Resolved conversations never
/// match: their tokens are dead.
pub async fn find_by_token(
    db: &Database,
    token: &str,
) -> Result<Option<Conversation>, ParleyError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE session_token = ?1 AND status != 'resolved'"
            );
            let mut stmt = conn.prepare(&sql)?;
            let result = stmt.query_row(params![token], row_to_conversation);
            match result {
                Ok(c) => Ok(Some(c)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List conversations, optionally filtered by status, most recent first.
pub async fn list_conversations(
    db: &Database,
    status: Option<ConversationStatus>,
) -> Result<Vec<Conversation>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut conversations = Vec::new();
            match status {
                Some(filter) => {
                    let sql = format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations
                         WHERE status = ?1 ORDER BY updated_at DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows =
                        stmt.query_map(params![filter.to_string()], row_to_conversation)?;
                    for row in rows {
                        conversations.push(row?);
                    }
                }
                None => {
                    let sql = format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations
                         ORDER BY updated_at DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt.query_map([], row_to_conversation)?;
                    for row in rows {
                        conversations.push(row?);
                    }
                }
            }
            Ok(conversations)
        })
        .await
        .map_err(map_tr_err)
}

/// Update status, assignment, and the requires-human flag in one write.
pub async fn update_status(
    db: &Database,
    id: &str,
    status: ConversationStatus,
    assignee: &Assignee,
    requires_human: bool,
) -> Result<(), ParleyError> {
    let id = id.to_string();
    let assigned = assignee.to_column();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations
                 SET status = ?1, assigned_to = ?2, requires_human = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![status.to_string(), assigned, requires_human, now_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Record the latest sentiment classification.
pub async fn set_sentiment(
    db: &Database,
    id: &str,
    sentiment: Sentiment,
) -> Result<(), ParleyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET sentiment = ?1 WHERE id = ?2",
                params![sentiment.to_string(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Store lead contact details in their dedicated columns.
pub async fn set_lead(db: &Database, id: &str, lead: &LeadContact) -> Result<(), ParleyError> {
    let id = id.to_string();
    let lead = lead.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations
                 SET lead_name = ?1, lead_email = ?2, lead_phone = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![lead.name, lead.email, lead.phone, now_rfc3339(), id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Apply an administrative intervention transactionally: the optional
/// message is inserted first, then the status flips. Either both commit or
/// neither does. This is the only path that may append to a conversation
/// in the same transaction that resolves it.
pub async fn apply_intervention(
    db: &Database,
    id: &str,
    status: ConversationStatus,
    assignee: &Assignee,
    requires_human: bool,
    message: Option<&ChatMessage>,
) -> Result<(), ParleyError> {
    let id = id.to_string();
    let assigned = assignee.to_column();
    let message = message.cloned();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            if let Some(m) = &message {
                tx.execute(
                    "INSERT INTO messages (id, conversation_id, sender, body, metadata, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        m.id,
                        m.conversation_id,
                        m.sender.to_string(),
                        m.body,
                        m.metadata,
                        m.created_at,
                    ],
                )?;
            }
            tx.execute(
                "UPDATE conversations
                 SET status = ?1, assigned_to = ?2, requires_human = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![status.to_string(), assigned, requires_human, now_rfc3339(), id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Conversations in any of `statuses` untouched since `cutoff` (RFC 3339).
/// Status strings come from the enum's Display, never from user input.
pub async fn stale_conversations(
    db: &Database,
    statuses: &[ConversationStatus],
    cutoff: &str,
) -> Result<Vec<Conversation>, ParleyError> {
    let cutoff = cutoff.to_string();
    let status_list = statuses
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(", ");
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {CONVERSATION_COLUMNS} FROM conversations
                 WHERE status IN ({status_list}) AND updated_at < ?1
                 ORDER BY updated_at ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![cutoff], row_to_conversation)?;
            let mut conversations = Vec::new();
            for row in rows {
                conversations.push(row?);
            }
            Ok(conversations)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn make_conversation(id: &str, token: &str) -> Conversation {
        Conversation {
            id: id.to_string(),
            session_token: token.to_string(),
            status: ConversationStatus::Active,
            assignee: Assignee::Ai,
            requires_human: false,
            sentiment: None,
            context: Some(r#"{"page":"/cart"}"#.to_string()),
            lead: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_get_round_trips() {
        let (db, _dir) = setup_db().await;
        let conversation = make_conversation("conv-1", "tok-1");
        create_conversation(&db, &conversation).await.unwrap();

        let got = get_conversation(&db, "conv-1").await.unwrap().unwrap();
        assert_eq!(got.id, "conv-1");
        assert_eq!(got.session_token, "tok-1");
        assert_eq!(got.status, ConversationStatus::Active);
        assert_eq!(got.assignee, Assignee::Ai);
        assert!(!got.requires_human);
        assert_eq!(got.context.as_deref(), Some(r#"{"page":"/cart"}"#));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn token_lookup_skips_resolved_conversations() {
        let (db, _dir) = setup_db().await;
        let conversation = make_conversation("conv-1", "tok-1");
        create_conversation(&db, &conversation).await.unwrap();

        assert!(find_by_token(&db, "tok-1").await.unwrap().is_some());

        update_status(
            &db,
            "conv-1",
            ConversationStatus::Resolved,
            &Assignee::Ai,
            false,
        )
        .await
        .unwrap();

        assert!(
            find_by_token(&db, "tok-1").await.unwrap().is_none(),
            "resolved conversation's token must be dead"
        );

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_live_token_is_rejected_but_resolved_token_reissues() {
        let (db, _dir) = setup_db().await;
        create_conversation(&db, &make_conversation("conv-1", "tok-1"))
            .await
            .unwrap();

        // A second live conversation with the same token violates the
        // partial unique index.
        let dup = make_conversation("conv-2", "tok-1");
        assert!(create_conversation(&db, &dup).await.is_err());

        // Once conv-1 is resolved the token may back a new conversation.
        update_status(
            &db,
            "conv-1",
            ConversationStatus::Resolved,
            &Assignee::Ai,
            false,
        )
        .await
        .unwrap();
        create_conversation(&db, &make_conversation("conv-3", "tok-1"))
            .await
            .unwrap();

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn lead_requires_all_three_columns_to_surface() {
        let (db, _dir) = setup_db().await;
        create_conversation(&db, &make_conversation("conv-1", "tok-1"))
            .await
            .unwrap();

        let lead = LeadContact {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "+15550100".into(),
        };
        set_lead(&db, "conv-1", &lead).await.unwrap();

        let got = get_conversation(&db, "conv-1").await.unwrap().unwrap();
        assert_eq!(got.lead, Some(lead));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sentiment_persists() {
        let (db, _dir) = setup_db().await;
        create_conversation(&db, &make_conversation("conv-1", "tok-1"))
            .await
            .unwrap();
        set_sentiment(&db, "conv-1", Sentiment::Urgent).await.unwrap();

        let got = get_conversation(&db, "conv-1").await.unwrap().unwrap();
        assert_eq!(got.sentiment, Some(Sentiment::Urgent));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn intervention_writes_message_and_flips_status_atomically() {
        let (db, _dir) = setup_db().await;
        create_conversation(&db, &make_conversation("conv-1", "tok-1"))
            .await
            .unwrap();

        let closing = ChatMessage {
            id: "msg-close".into(),
            conversation_id: "conv-1".into(),
            sender: parley_core::Sender::Agent,
            body: "Glad we could help!".into(),
            metadata: None,
            created_at: "2026-01-01T01:00:00.000Z".into(),
        };
        apply_intervention(
            &db,
            "conv-1",
            ConversationStatus::Resolved,
            &Assignee::Agent("agent-1".into()),
            false,
            Some(&closing),
        )
        .await
        .unwrap();

        let got = get_conversation(&db, "conv-1").await.unwrap().unwrap();
        assert_eq!(got.status, ConversationStatus::Resolved);
        assert_eq!(got.assignee, Assignee::Agent("agent-1".into()));

        let messages = crate::queries::messages::messages_for(&db, "conv-1", None)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "Glad we could help!");

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn stale_query_honors_cutoff_and_statuses() {
        let (db, _dir) = setup_db().await;
        create_conversation(&db, &make_conversation("conv-old", "tok-old"))
            .await
            .unwrap();
        let mut fresh = make_conversation("conv-new", "tok-new");
        fresh.updated_at = "2026-06-01T00:00:00.000Z".to_string();
        create_conversation(&db, &fresh).await.unwrap();

        let stale = stale_conversations(
            &db,
            &[ConversationStatus::Active, ConversationStatus::AiHandling],
            "2026-03-01T00:00:00.000Z",
        )
        .await
        .unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, "conv-old");

        db.close().await.unwrap();
    }
}
