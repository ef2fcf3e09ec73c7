// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session identity and throttling for the Parley support engine.
//!
//! Token issue/liveness is pure; the rate limiter operates on an injected
//! counter store so deployments choose between in-process and shared
//! backends.

pub mod rate_limit;
pub mod token;

pub use rate_limit::{InMemoryRateLimitStore, RateLimitStore, RateLimiter};
