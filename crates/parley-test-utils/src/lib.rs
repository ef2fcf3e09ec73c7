// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides a mock completion engine, a store wrapper with a switchable
//! outage, and a harness assembling the full engine over temp SQLite for
//! fast, deterministic, CI-runnable tests.

pub mod flaky_store;
pub mod harness;
pub mod mock_completion;

pub use flaky_store::FlakyStore;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_completion::MockCompletion;
