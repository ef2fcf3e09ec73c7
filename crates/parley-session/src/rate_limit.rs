// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window request throttle keyed by session token.
//!
//! The counter store is injected rather than held as module-level state:
//! single-instance deployments use [`InMemoryRateLimitStore`], and a
//! multi-instance deployment can supply a shared implementation. The
//! contract only requires per-token independence and eviction of
//! timestamps older than the window.
//!
//! The limiter is consulted before the token is even looked up, so
//! fabricated tokens create window entries too. Fully expired windows are
//! reaped on an amortized schedule so abandoned tokens do not accumulate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use parley_config::model::RateLimitConfig;
use parley_core::ParleyError;

/// Per-token timestamp window storage.
///
/// `try_record` must be effectively atomic per token: evict entries older
/// than `window`, then either record `now` (admitting the request) or
/// refuse and report the oldest surviving timestamp so the caller can
/// compute a backoff hint.
pub trait RateLimitStore: Send + Sync {
    fn try_record(
        &self,
        token: &str,
        now: Instant,
        window: Duration,
        max: usize,
    ) -> Result<(), Instant>;

    /// Drop every token whose entire window has expired.
    fn reap(&self, now: Instant, window: Duration);
}

/// In-process store for single-instance deployments. The DashMap shard
/// lock makes the check-then-increment atomic per token.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<String, VecDeque<Instant>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tokens currently holding a window entry.
    pub fn tracked_tokens(&self) -> usize {
        self.windows.len()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn try_record(
        &self,
        token: &str,
        now: Instant,
        window: Duration,
        max: usize,
    ) -> Result<(), Instant> {
        let mut entry = self.windows.entry(token.to_string()).or_default();
        while let Some(&front) = entry.front() {
            if now.duration_since(front) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }
        if entry.len() < max {
            entry.push_back(now);
            Ok(())
        } else {
            // Window is full; front is the oldest surviving timestamp.
            Err(*entry.front().unwrap_or(&now))
        }
    }

    fn reap(&self, now: Instant, window: Duration) {
        self.windows
            .retain(|_, timestamps| {
                timestamps
                    .back()
                    .is_some_and(|&newest| now.duration_since(newest) < window)
            });
    }
}

/// Every this many admission checks, fully expired windows are reaped.
const REAP_EVERY: usize = 1024;

/// Sliding-window rate limiter. A violation is retryable and mutates no
/// conversation state; it carries a `retry_after_secs` hint derived from
/// when the oldest in-window request expires.
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    max_messages: usize,
    window: Duration,
    checks: AtomicUsize,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            max_messages: config.max_messages,
            window: Duration::from_secs(config.window_secs),
            checks: AtomicUsize::new(0),
        }
    }

    /// Admit or reject a request for `token` right now.
    pub fn check(&self, token: &str) -> Result<(), ParleyError> {
        self.check_at(token, Instant::now())
    }

    fn check_at(&self, token: &str, now: Instant) -> Result<(), ParleyError> {
        // Growth is driven by checks, so amortizing the reap over them
        // bounds the store without a dedicated background task.
        if self.checks.fetch_add(1, Ordering::Relaxed) % REAP_EVERY == REAP_EVERY - 1 {
            self.store.reap(now, self.window);
        }
        match self
            .store
            .try_record(token, now, self.window, self.max_messages)
        {
            Ok(()) => Ok(()),
            Err(oldest) => {
                let elapsed = now.duration_since(oldest);
                let remaining = self.window.saturating_sub(elapsed);
                let retry_after_secs = remaining.as_secs().max(1);
                Err(ParleyError::RateLimited { retry_after_secs })
            }
        }
    }
}
