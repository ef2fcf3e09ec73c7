// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Parley support engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed query
//! modules for conversations and their append-only messages.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
