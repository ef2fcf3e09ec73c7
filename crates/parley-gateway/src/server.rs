// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Route groups: an unauthenticated /health, the customer API, the
//! secret-gated admin API, and the WebSocket subscription endpoint (which
//! authorizes during the handshake rather than via middleware).

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use parley_core::ParleyError;
use parley_engine::{AdminService, ChatService};
use parley_realtime::InProcessBroker;

use crate::admin;
use crate::auth::{admin_auth_middleware, AuthConfig};
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub chat: Arc<ChatService>,
    pub admin: Arc<AdminService>,
    /// Concrete broker handle; subscribing is not part of the publish
    /// trait the engine sees.
    pub broker: Arc<InProcessBroker>,
    pub auth: AuthConfig,
    /// Token lifetime advertised to clients so they can expire a held
    /// token without a round trip.
    pub session_ttl_secs: u64,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

/// Gateway bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the full route tree over `state`.
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .with_state(state.clone());

    let customer_routes = Router::new()
        .route("/v1/session", post(handlers::post_session))
        .route("/v1/messages", post(handlers::post_message))
        .route("/v1/history/{token}", get(handlers::get_history))
        .route("/v1/lead", post(handlers::post_lead))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/v1/admin/conversations", get(admin::list_conversations))
        .route("/v1/admin/conversations/{id}", get(admin::conversation_detail))
        .route(
            "/v1/admin/conversations/{id}/action",
            post(admin::conversation_action),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.auth.clone(),
            admin_auth_middleware,
        ))
        .with_state(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(customer_routes)
        .merge(admin_routes)
        .merge(ws_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the process is stopped.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), ParleyError> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| ParleyError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
