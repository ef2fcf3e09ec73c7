// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inactivity sweep.
//!
//! Periodically resolves unattended conversations (active or ai_handling)
//! whose last activity is older than the configured idle window.
//! Conversations awaiting or under human attention are never swept; those
//! stay open until an administrator closes them.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use parley_config::model::HousekeepingConfig;
use parley_core::{
    ChatEvent, ConversationStatus, ConversationStore, ParleyError, RealtimeChannel,
};

use crate::fanout::broadcast;
use crate::state::{transition, StatusEvent};

/// Statuses eligible for the inactivity sweep.
const SWEEPABLE: &[ConversationStatus] =
    &[ConversationStatus::Active, ConversationStatus::AiHandling];

pub struct Housekeeper {
    store: Arc<dyn ConversationStore>,
    realtime: Arc<dyn RealtimeChannel>,
    config: HousekeepingConfig,
}

impl Housekeeper {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        realtime: Arc<dyn RealtimeChannel>,
        config: HousekeepingConfig,
    ) -> Self {
        Self {
            store,
            realtime,
            config,
        }
    }

    /// One sweep pass. Returns the number of conversations resolved.
    pub async fn run_once(&self) -> Result<usize, ParleyError> {
        let cutoff = (Utc::now()
            - ChronoDuration::seconds(self.config.idle_resolve_secs as i64))
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string();
        let stale = self.store.stale_conversations(SWEEPABLE, &cutoff).await?;
        if stale.is_empty() {
            debug!("housekeeping sweep found nothing to resolve");
            return Ok(0);
        }

        let mut resolved = 0;
        for conversation in stale {
            let next = match transition(conversation.status, &StatusEvent::InactivityTimeout) {
                Ok(t) => t.next,
                // Raced an intervention between query and sweep; skip.
                Err(rejected) => {
                    debug!(conversation_id = %conversation.id, %rejected, "skipping swept conversation");
                    continue;
                }
            };
            if let Err(e) = self
                .store
                .update_status(&conversation.id, next, &conversation.assignee, false)
                .await
            {
                warn!(error = %e, conversation_id = %conversation.id, "inactivity resolve failed");
                continue;
            }
            broadcast(
                &self.realtime,
                &conversation.session_token,
                &ChatEvent::ConversationResolved {
                    conversation_id: conversation.id.clone(),
                },
            )
            .await;
            resolved += 1;
        }
        info!(resolved, "housekeeping sweep complete");
        Ok(resolved)
    }

    /// Run the sweep on its configured interval until the task is aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        let mut ticker = interval(Duration::from_secs(self.config.sweep_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    warn!(error = %e, "housekeeping sweep failed");
                }
            }
        })
    }
}
