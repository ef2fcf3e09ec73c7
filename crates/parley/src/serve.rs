// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Wires the full stack: SQLite storage, the completion client, the
//! in-process broker, the chat/admin services, the housekeeping sweep, and
//! the HTTP/WebSocket gateway. Shuts down cleanly on Ctrl-C, checkpointing
//! the database on the way out.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use parley_completion::HttpCompletionClient;
use parley_config::model::ParleyConfig;
use parley_core::error::ParleyError;
use parley_core::{ConversationStore, Notifier};
use parley_engine::{notify, AdminService, ChatService, Housekeeper};
use parley_gateway::{AuthConfig, GatewayState, ServerConfig};
use parley_realtime::InProcessBroker;
use parley_session::{InMemoryRateLimitStore, RateLimiter};
use parley_storage::SqliteStore;

/// Run the `parley serve` command until interrupted.
pub async fn run_serve(config: ParleyConfig) -> Result<(), ParleyError> {
    init_tracing(&config.server.log_level);

    info!("starting parley serve");

    let sqlite = Arc::new(SqliteStore::new(config.storage.clone()));
    sqlite.initialize().await?;
    let store: Arc<dyn ConversationStore> = sqlite.clone();

    let completion = Arc::new(HttpCompletionClient::new(&config.completion)?);
    let broker = Arc::new(InProcessBroker::default());
    let notifier: Arc<dyn Notifier> = Arc::from(notify::from_config(&config.notify)?);
    let limiter = Arc::new(RateLimiter::new(
        Arc::new(InMemoryRateLimitStore::new()),
        &config.rate_limit,
    ));

    let chat = Arc::new(ChatService::new(
        Arc::clone(&store),
        completion,
        broker.clone(),
        notifier,
        limiter,
        &config,
    ));
    let admin = Arc::new(AdminService::new(Arc::clone(&store), broker.clone()));

    let housekeeping_handle = if config.housekeeping.enabled {
        let housekeeper = Arc::new(Housekeeper::new(
            Arc::clone(&store),
            broker.clone(),
            config.housekeeping.clone(),
        ));
        info!(
            idle_resolve_secs = config.housekeeping.idle_resolve_secs,
            sweep_interval_secs = config.housekeeping.sweep_interval_secs,
            "housekeeping sweep enabled"
        );
        Some(housekeeper.spawn())
    } else {
        info!("housekeeping sweep disabled by configuration");
        None
    };

    if config.admin.secret.is_none() {
        warn!("no admin secret configured -- administrative routes will reject all requests");
    }

    let state = GatewayState {
        chat,
        admin,
        broker,
        auth: AuthConfig::new(config.admin.secret.clone()),
        session_ttl_secs: config.session.token_ttl_secs,
        start_time: Instant::now(),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    tokio::select! {
        result = parley_gateway::start_server(&server_config, state) => {
            if let Err(e) = &result {
                warn!(error = %e, "gateway exited with error");
            }
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    if let Some(handle) = housekeeping_handle {
        handle.abort();
    }
    sqlite.close().await?;
    info!("parley serve shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from the configured log level,
/// honoring `RUST_LOG` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("parley={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
