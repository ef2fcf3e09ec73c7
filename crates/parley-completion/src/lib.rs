// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Completion engine client for the Parley support engine.
//!
//! Wraps the natural-language completion service behind the narrow
//! [`parley_core::CompletionEngine`] contract: ordered history plus
//! free-text context in, `{ text, flagged_for_human, confidence }` out.

pub mod client;
pub mod heuristics;
pub mod types;

pub use client::HttpCompletionClient;
