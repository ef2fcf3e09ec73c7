// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket subscription endpoint.
//!
//! Clients subscribe to one channel per connection:
//! `GET /ws?channel=chat-{token}` for a conversation's private stream, or
//! `GET /ws?channel=support-admin&secret=...` for the admin stream. The
//! socket is outbound-only; each event goes out as JSON:
//!
//! ```json
//! {"channel": "chat-abc", "event": "message.created", "data": {...}}
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use parley_realtime::{Subscription, ADMIN_CHANNEL};

use crate::server::GatewayState;

/// Query parameters for the WebSocket handshake.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub channel: String,
    #[serde(default)]
    pub secret: Option<String>,
}

/// WebSocket upgrade handler. Channel authorization happens during the
/// handshake: the admin channel requires the shared secret, conversation
/// channels are guarded by token secrecy (the channel name embeds the
/// session token only its owner knows).
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<GatewayState>,
) -> Response {
    if params.channel == ADMIN_CHANNEL {
        let authorized = matches!(&params.secret, Some(s) if state.auth.verify(s));
        if !authorized {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    } else if !params.channel.starts_with("chat-") {
        return StatusCode::BAD_REQUEST.into_response();
    }

    let subscription = state.broker.subscribe(&params.channel);
    ws.on_upgrade(move |socket| forward_events(socket, subscription))
}

/// Pump broker events to the socket until either side goes away. Dropping
/// the subscription on exit unsubscribes the channel.
async fn forward_events(socket: WebSocket, mut subscription: Subscription) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let data: serde_json::Value = serde_json::from_str(&event.payload)
                    .unwrap_or(serde_json::Value::Null);
                let frame = serde_json::json!({
                    "channel": event.channel,
                    "event": event.event,
                    "data": data,
                })
                .to_string();
                if sender.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    // Outbound-only: tolerate pings, drop on close/error.
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}
