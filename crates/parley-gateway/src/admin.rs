// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Administrative HTTP handlers.
//!
//! GET /v1/admin/conversations, GET /v1/admin/conversations/{id},
//! POST /v1/admin/conversations/{id}/action. All sit behind the admin
//! secret middleware.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use parley_core::{Conversation, ConversationStatus};
use parley_engine::AdminAction;

use crate::error::error_response;
use crate::handlers::MessageBody;
use crate::server::GatewayState;

/// Query parameters for the conversation list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
}

/// Response body for the conversation list.
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
}

/// Response body for conversation detail.
#[derive(Debug, Serialize)]
pub struct ConversationDetailResponse {
    pub conversation: Conversation,
    pub messages: Vec<MessageBody>,
}

/// Response body for an applied intervention.
#[derive(Debug, Serialize)]
pub struct InterventionResponse {
    pub conversation: Conversation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageBody>,
}

/// GET /v1/admin/conversations
pub async fn list_conversations(
    State(state): State<GatewayState>,
    Query(params): Query<ListParams>,
) -> Response {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => match ConversationStatus::from_str(raw) {
            Ok(status) => Some(status),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": format!("unknown status {raw}") })),
                )
                    .into_response()
            }
        },
    };
    match state.admin.list_conversations(status).await {
        Ok(conversations) => {
            (StatusCode::OK, Json(ConversationListResponse { conversations })).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /v1/admin/conversations/{id}
pub async fn conversation_detail(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Response {
    match state.admin.conversation_detail(&id).await {
        Ok((conversation, messages)) => (
            StatusCode::OK,
            Json(ConversationDetailResponse {
                conversation,
                messages: messages.iter().map(MessageBody::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /v1/admin/conversations/{id}/action
pub async fn conversation_action(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(action): Json<AdminAction>,
) -> Response {
    match state.admin.intervene(&id, action).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(InterventionResponse {
                conversation: outcome.conversation,
                message: outcome.message.as_ref().map(MessageBody::from),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
