// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer-facing HTTP handlers.
//!
//! POST /v1/session, POST /v1/messages, GET /v1/history/{token},
//! POST /v1/lead, plus the unauthenticated GET /health.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use parley_core::{ChatMessage, ConversationStatus, LeadContact, Sender};

use crate::error::error_response;
use crate::server::GatewayState;

/// Request body for POST /v1/session.
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    /// Previously issued token to resume, if the client holds one.
    #[serde(default)]
    pub session_token: Option<String>,
    /// Free-form JSON context (originating page, viewed item, cart).
    #[serde(default)]
    pub context: Option<String>,
}

/// Response body for POST /v1/session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_token: String,
    pub conversation_id: String,
    pub status: ConversationStatus,
    pub resumed: bool,
    /// When the token was issued (the conversation's creation time), so
    /// the client can drop an expired token without asking the server.
    pub issued_at: String,
    pub ttl_secs: u64,
    pub messages: Vec<MessageBody>,
}

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub session_token: String,
    pub body: String,
}

/// Response body for POST /v1/messages.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub message_id: String,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ConversationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<MessageBody>,
    /// Reply text delivered without a durable record (degraded mode or a
    /// failed reply persist).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
}

/// One message as rendered to clients.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub id: String,
    pub sender: Sender,
    pub body: String,
    pub created_at: String,
}

impl From<&ChatMessage> for MessageBody {
    fn from(m: &ChatMessage) -> Self {
        Self {
            id: m.id.clone(),
            sender: m.sender,
            body: m.body.clone(),
            created_at: m.created_at.clone(),
        }
    }
}

/// Response body for GET /v1/history/{token}.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub conversation_id: String,
    pub status: ConversationStatus,
    pub requires_human: bool,
    pub messages: Vec<MessageBody>,
}

/// Request body for POST /v1/lead.
#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub session_token: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /v1/session
pub async fn post_session(
    State(state): State<GatewayState>,
    Json(body): Json<SessionRequest>,
) -> Response {
    match state
        .chat
        .start_session(body.session_token.as_deref(), body.context)
        .await
    {
        Ok(start) => (
            StatusCode::OK,
            Json(SessionResponse {
                session_token: start.token.as_str().to_string(),
                conversation_id: start.conversation.id.clone(),
                status: start.conversation.status,
                resumed: start.resumed,
                issued_at: start.conversation.created_at.clone(),
                ttl_secs: state.session_ttl_secs,
                messages: start.history.iter().map(MessageBody::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /v1/messages
///
/// Always 200 for an accepted message, including degraded mode; the
/// customer-visible contract is "you sent a message, here is the answer".
pub async fn post_message(
    State(state): State<GatewayState>,
    Json(body): Json<SendMessageRequest>,
) -> Response {
    match state
        .chat
        .handle_customer_message(&body.session_token, &body.body)
        .await
    {
        Ok(ack) => {
            let reply = ack.reply.as_ref().map(MessageBody::from);
            // Only surface transient text when there is no durable reply
            // record carrying the same content.
            let reply_text = if reply.is_some() { None } else { ack.reply_text };
            (
                StatusCode::OK,
                Json(SendMessageResponse {
                    message_id: ack.message_id,
                    degraded: ack.degraded,
                    status: ack.status,
                    reply,
                    reply_text,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /v1/history/{token}
pub async fn get_history(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
) -> Response {
    match state.chat.history(&token).await {
        Ok((conversation, messages)) => (
            StatusCode::OK,
            Json(HistoryResponse {
                conversation_id: conversation.id,
                status: conversation.status,
                requires_human: conversation.requires_human,
                messages: messages.iter().map(MessageBody::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /v1/lead
pub async fn post_lead(
    State(state): State<GatewayState>,
    Json(body): Json<LeadRequest>,
) -> Response {
    let lead = LeadContact {
        name: body.name,
        email: body.email,
        phone: body.phone,
    };
    match state.chat.capture_lead(&body.session_token, &lead).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health (unauthenticated)
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
