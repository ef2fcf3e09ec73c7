// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The engine consumes its external collaborators (persistent store,
//! completion engine, real-time channel service, notification service)
//! exclusively through these traits, all `#[async_trait]` for dynamic
//! dispatch behind `Arc<dyn _>`.

pub mod completion;
pub mod notify;
pub mod realtime;
pub mod store;

pub use completion::CompletionEngine;
pub use notify::Notifier;
pub use realtime::RealtimeChannel;
pub use store::ConversationStore;
