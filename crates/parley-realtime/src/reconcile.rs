// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optimistic message reconciliation.
//!
//! The originating client renders an unconfirmed entry the moment the
//! customer hits send. The durable record arrives later -- over the HTTP
//! response or the broadcast, in either order, possibly both. This model
//! guarantees exactly one visible bubble per message: broadcasts are
//! deduped by id, and a durable record replaces the matching optimistic
//! entry in place (same sender, same body, first pending position) rather
//! than appending.
//!
//! Optimistic entries are a view-layer artifact only; nothing here is
//! persisted.

use parley_core::types::{ChatMessage, Sender};

/// One renderable message entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub sender: Sender,
    pub body: String,
    /// Empty until confirmed; pending entries sort after confirmed ones
    /// with timestamps.
    pub created_at: String,
    /// True while awaiting the durable record.
    pub pending: bool,
}

/// Client-visible message list with optimistic reconciliation.
#[derive(Debug, Default)]
pub struct ReconcilingView {
    entries: Vec<MessageView>,
    next_pending: u64,
}

impl ReconcilingView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render an unconfirmed entry immediately on submit. Returns the
    /// temporary id.
    pub fn push_optimistic(&mut self, sender: Sender, body: &str) -> String {
        let id = format!("pending-{}", self.next_pending);
        self.next_pending += 1;
        self.entries.push(MessageView {
            id: id.clone(),
            sender,
            body: body.to_string(),
            created_at: String::new(),
            pending: true,
        });
        id
    }

    /// Apply a durable record from either the HTTP response or a
    /// broadcast. Idempotent on message id.
    pub fn apply_durable(&mut self, message: &ChatMessage) {
        // Dedupe: at-least-once delivery may replay the same record.
        if self.entries.iter().any(|e| e.id == message.id) {
            return;
        }

        // Replace the first matching optimistic entry in place.
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.pending && e.sender == message.sender && e.body == message.body)
        {
            entry.id = message.id.clone();
            entry.created_at = message.created_at.clone();
            entry.pending = false;
        } else {
            self.entries.push(MessageView {
                id: message.id.clone(),
                sender: message.sender,
                body: message.body.clone(),
                created_at: message.created_at.clone(),
                pending: false,
            });
        }

        // Arrival order is not creation order; re-sort confirmed entries
        // by timestamp (stable: ties keep insertion order, pending
        // entries keep their place at the end).
        self.entries.sort_by(|a, b| match (a.pending, b.pending) {
            (false, false) => a.created_at.cmp(&b.created_at),
            (false, true) => std::cmp::Ordering::Less,
            (true, false) => std::cmp::Ordering::Greater,
            (true, true) => std::cmp::Ordering::Equal,
        });
    }

    /// Current renderable list.
    pub fn entries(&self) -> &[MessageView] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn durable(id: &str, sender: Sender, body: &str, at: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            conversation_id: "conv-1".to_string(),
            sender,
            body: body.to_string(),
            metadata: None,
            created_at: at.to_string(),
        }
    }

    #[test]
    fn optimistic_entry_is_replaced_in_place() {
        let mut view = ReconcilingView::new();
        view.push_optimistic(Sender::Customer, "X");
        view.apply_durable(&durable("42", Sender::Customer, "X", "2026-01-01T00:00:01.000Z"));

        let entries = view.entries();
        assert_eq!(entries.len(), 1, "exactly one visible bubble");
        assert_eq!(entries[0].id, "42");
        assert!(!entries[0].pending);
    }

    #[test]
    fn duplicate_broadcast_is_ignored() {
        let mut view = ReconcilingView::new();
        view.push_optimistic(Sender::Customer, "X");
        let msg = durable("42", Sender::Customer, "X", "2026-01-01T00:00:01.000Z");
        view.apply_durable(&msg);
        view.apply_durable(&msg);
        assert_eq!(view.entries().len(), 1);
    }

    #[test]
    fn broadcast_before_http_response_still_yields_one_bubble() {
        // The race the design tolerates: durable record arrives via the
        // broadcast first, then again via the HTTP response.
        let mut view = ReconcilingView::new();
        view.push_optimistic(Sender::Customer, "X");
        let from_broadcast = durable("42", Sender::Customer, "X", "2026-01-01T00:00:01.000Z");
        let from_response = from_broadcast.clone();
        view.apply_durable(&from_broadcast);
        view.apply_durable(&from_response);

        assert_eq!(view.entries().len(), 1);
        assert_eq!(view.entries()[0].id, "42");
    }

    #[test]
    fn identical_bodies_reconcile_by_ordinal_position() {
        let mut view = ReconcilingView::new();
        view.push_optimistic(Sender::Customer, "hello");
        view.push_optimistic(Sender::Customer, "hello");

        view.apply_durable(&durable("1", Sender::Customer, "hello", "2026-01-01T00:00:01.000Z"));
        view.apply_durable(&durable("2", Sender::Customer, "hello", "2026-01-01T00:00:02.000Z"));

        let ids: Vec<&str> = view.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn out_of_order_arrival_is_resorted_by_timestamp() {
        let mut view = ReconcilingView::new();
        view.apply_durable(&durable("2", Sender::Assistant, "second", "2026-01-01T00:00:02.000Z"));
        view.apply_durable(&durable("1", Sender::Customer, "first", "2026-01-01T00:00:01.000Z"));

        let bodies: Vec<&str> = view.entries().iter().map(|e| e.body.as_str()).collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }

    #[test]
    fn unrelated_broadcast_does_not_consume_optimistic_entry() {
        let mut view = ReconcilingView::new();
        view.push_optimistic(Sender::Customer, "mine");
        view.apply_durable(&durable("9", Sender::Assistant, "reply", "2026-01-01T00:00:01.000Z"));

        assert_eq!(view.entries().len(), 2);
        let pending: Vec<_> = view.entries().iter().filter(|e| e.pending).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].body, "mine");
    }
}
