// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Parley support engine.
//!
//! Exposes the customer API (session, messages, history, lead capture),
//! the secret-gated administrative API, the real-time subscription socket,
//! and an unauthenticated health probe.

pub mod admin;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use auth::{AuthConfig, ADMIN_SECRET_HEADER};
pub use server::{router, start_server, GatewayState, ServerConfig};
