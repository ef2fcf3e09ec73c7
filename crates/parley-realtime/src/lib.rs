// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real-time fan-out layer for the Parley support engine.
//!
//! Publishes every message and state change to a private per-conversation
//! channel plus the shared administrative channel. Delivery is
//! at-least-once and unordered; the [`reconcile`] module gives consumers
//! the idempotent client-side model the contract requires.

pub mod backoff;
pub mod broker;
pub mod channels;
pub mod reconcile;

pub use backoff::Backoff;
pub use broker::{ChannelEvent, InProcessBroker, Subscription};
pub use channels::{conversation_channel, ADMIN_CHANNEL};
pub use reconcile::{MessageView, ReconcilingView};
