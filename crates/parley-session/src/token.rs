// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session token issue and liveness. Pure: no I/O, no server round-trip.
//!
//! Liveness is a client-side convenience -- the client decides when to ask
//! for a fresh token based on its own held `issued_at`. The server-side
//! conversation lookup remains authoritative for whether content may still
//! be appended.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use parley_core::SessionToken;

/// Default token time-to-live: 2 hours.
pub const DEFAULT_TTL_SECS: u64 = 2 * 60 * 60;

/// Issue a fresh session token unpredictable to third parties: a UUIDv4
/// plus 128 bits of independent randomness.
pub fn issue() -> SessionToken {
    let mut suffix = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut suffix);
    let suffix_hex: String = suffix.iter().map(|b| format!("{b:02x}")).collect();
    SessionToken(format!("{}{}", uuid::Uuid::new_v4().simple(), suffix_hex))
}

/// True iff `now - issued_at < ttl_secs`.
pub fn is_live(issued_at: DateTime<Utc>, now: DateTime<Utc>, ttl_secs: u64) -> bool {
    now.signed_duration_since(issued_at) < Duration::seconds(ttl_secs as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_are_unique_and_opaque() {
        let a = issue();
        let b = issue();
        assert_ne!(a, b);
        // 32 hex chars of uuid + 32 hex chars of suffix.
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn liveness_boundary() {
        let issued = Utc::now();
        assert!(is_live(issued, issued, DEFAULT_TTL_SECS));
        assert!(is_live(
            issued,
            issued + Duration::seconds(DEFAULT_TTL_SECS as i64 - 1),
            DEFAULT_TTL_SECS
        ));
        // Exactly at the TTL the token is no longer live.
        assert!(!is_live(
            issued,
            issued + Duration::seconds(DEFAULT_TTL_SECS as i64),
            DEFAULT_TTL_SECS
        ));
    }

    #[test]
    fn clock_skew_before_issue_counts_as_live() {
        let issued = Utc::now();
        let earlier = issued - Duration::seconds(30);
        assert!(is_live(issued, earlier, DEFAULT_TTL_SECS));
    }
}
