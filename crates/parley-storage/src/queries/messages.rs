// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message append and retrieval. Messages are append-only: there is no
//! update or delete here by design.

use parley_core::types::ChatMessage;
use parley_core::ParleyError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::queries::row_to_message;

/// Append a message and touch the owning conversation's `updated_at` in
/// one transaction.
pub async fn append_message(db: &Database, msg: &ChatMessage) -> Result<(), ParleyError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO messages (id, conversation_id, sender, body, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    msg.id,
                    msg.conversation_id,
                    msg.sender.to_string(),
                    msg.body,
                    msg.metadata,
                    msg.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                params![msg.created_at, msg.conversation_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Messages for a conversation in persistence order: chronological, with
/// insertion order (rowid) breaking timestamp ties.
pub async fn messages_for(
    db: &Database,
    conversation_id: &str,
    limit: Option<i64>,
) -> Result<Vec<ChatMessage>, ParleyError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let mut stmt = conn.prepare(
                        "SELECT id, conversation_id, sender, body, metadata, created_at
                         FROM messages WHERE conversation_id = ?1
                         ORDER BY created_at ASC, rowid ASC LIMIT ?2",
                    )?;
                    let rows = stmt.query_map(params![conversation_id, lim], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, conversation_id, sender, body, metadata, created_at
                         FROM messages WHERE conversation_id = ?1
                         ORDER BY created_at ASC, rowid ASC",
                    )?;
                    let rows = stmt.query_map(params![conversation_id], row_to_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}
