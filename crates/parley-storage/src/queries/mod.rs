// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. All functions accept `&Database` and go through
//! the single-writer connection.

pub mod conversations;
pub mod messages;

use parley_core::types::{
    Assignee, ChatMessage, Conversation, ConversationStatus, LeadContact, Sender, Sentiment,
};

/// Column list used by every conversation SELECT, in mapping order.
pub(crate) const CONVERSATION_COLUMNS: &str = "id, session_token, status, assigned_to, \
     requires_human, sentiment, context, lead_name, lead_email, lead_phone, \
     created_at, updated_at";

/// Map a conversation row. Enum columns that fail to parse surface as
/// conversion failures rather than panics.
pub(crate) fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let status: String = row.get(2)?;
    let status = status
        .parse::<ConversationStatus>()
        .map_err(|e| conversion_err(2, e))?;

    let assigned: String = row.get(3)?;

    let sentiment: Option<String> = row.get(5)?;
    let sentiment = match sentiment {
        Some(s) => Some(s.parse::<Sentiment>().map_err(|e| conversion_err(5, e))?),
        None => None,
    };

    let lead_name: Option<String> = row.get(7)?;
    let lead_email: Option<String> = row.get(8)?;
    let lead_phone: Option<String> = row.get(9)?;
    let lead = match (lead_name, lead_email, lead_phone) {
        (Some(name), Some(email), Some(phone)) => Some(LeadContact { name, email, phone }),
        _ => None,
    };

    Ok(Conversation {
        id: row.get(0)?,
        session_token: row.get(1)?,
        status,
        assignee: Assignee::from_column(&assigned),
        requires_human: row.get(4)?,
        sentiment,
        context: row.get(6)?,
        lead,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Map a message row (id, conversation_id, sender, body, metadata, created_at).
pub(crate) fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    let sender: String = row.get(2)?;
    let sender = sender.parse::<Sender>().map_err(|e| conversion_err(2, e))?;
    Ok(ChatMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender,
        body: row.get(3)?,
        metadata: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}
