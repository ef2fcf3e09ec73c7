// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process fan-out broker.
//!
//! Implements the [`RealtimeChannel`] publish contract over per-channel
//! `tokio::sync::broadcast`. Delivery is at-least-once with no ordering
//! guarantee across channels; a slow subscriber may observe lag (dropped
//! backlog), which it handles by re-fetching history -- consumers are
//! required to dedupe on message id and re-sort by timestamp anyway.
//!
//! Subscriptions are scoped handles: dropping a [`Subscription`] detaches
//! it, and the channel entry itself is removed once the last subscriber is
//! gone. No manual bind/unbind lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use parley_core::{ParleyError, RealtimeChannel};

/// One delivered event.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub channel: String,
    pub event: String,
    pub payload: String,
}

/// In-process broker for single-instance deployments.
pub struct InProcessBroker {
    channels: DashMap<String, broadcast::Sender<ChannelEvent>>,
    capacity: usize,
}

impl InProcessBroker {
    /// Create a broker whose per-channel buffer holds `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to a channel, creating it if needed. The returned handle
    /// unsubscribes on drop.
    pub fn subscribe(self: &Arc<Self>, channel: &str) -> Subscription {
        let sender = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone();
        let receiver = sender.subscribe();
        Subscription {
            channel: channel.to_string(),
            receiver: Some(receiver),
            broker: Arc::clone(self),
        }
    }

    /// Number of live channels (test observability).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn cleanup(&self, channel: &str) {
        // Remove the entry only if no subscriber remains.
        self.channels
            .remove_if(channel, |_, sender| sender.receiver_count() == 0);
    }
}

impl Default for InProcessBroker {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl RealtimeChannel for InProcessBroker {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: &str,
    ) -> Result<(), ParleyError> {
        let delivered = match self.channels.get(channel) {
            Some(sender) => sender.send(ChannelEvent {
                channel: channel.to_string(),
                event: event.to_string(),
                payload: payload.to_string(),
            }),
            None => {
                // Publishing to a channel nobody has joined is not an
                // error; there is no subscriber guarantee.
                debug!(channel, event, "publish with no subscribers");
                return Ok(());
            }
        };
        match delivered {
            Ok(count) => {
                debug!(channel, event, subscribers = count, "event published");
                Ok(())
            }
            // All receivers dropped between lookup and send.
            Err(_) => {
                debug!(channel, event, "publish raced subscriber teardown");
                Ok(())
            }
        }
    }
}

/// Scoped subscription handle. Receives events for one channel and
/// guarantees unsubscribe when it goes out of scope.
pub struct Subscription {
    channel: String,
    receiver: Option<broadcast::Receiver<ChannelEvent>>,
    broker: Arc<InProcessBroker>,
}

impl Subscription {
    /// Channel this handle is attached to.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Receive the next event. Returns `None` when the channel is closed.
    ///
    /// Lag (a slow consumer overrun by the buffer) is logged and skipped;
    /// the consumer recovers by re-fetching history, which the ordering
    /// contract requires it to tolerate anyway.
    pub async fn recv(&mut self) -> Option<ChannelEvent> {
        let receiver = self.receiver.as_mut()?;
        loop {
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        channel = %self.channel,
                        skipped,
                        "subscriber lagged, events dropped"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Release our receiver first so the count reflects reality, then
        // let the broker reap the channel if we were the last one.
        self.receiver.take();
        self.broker.cleanup(&self.channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_events_reach_all_subscribers() {
        let broker = Arc::new(InProcessBroker::default());
        let mut sub_a = broker.subscribe("chat-t1");
        let mut sub_b = broker.subscribe("chat-t1");

        broker
            .publish("chat-t1", "message.created", r#"{"id":"m1"}"#)
            .await
            .unwrap();

        let got_a = sub_a.recv().await.unwrap();
        let got_b = sub_b.recv().await.unwrap();
        assert_eq!(got_a.event, "message.created");
        assert_eq!(got_a, got_b);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let broker = Arc::new(InProcessBroker::default());
        let mut private = broker.subscribe("chat-t1");
        let mut admin = broker.subscribe("support-admin");

        broker
            .publish("support-admin", "conversation.updated", "{}")
            .await
            .unwrap();

        let got = admin.recv().await.unwrap();
        assert_eq!(got.channel, "support-admin");

        // The private channel saw nothing.
        broker.publish("chat-t1", "message.created", "{}").await.unwrap();
        let got = private.recv().await.unwrap();
        assert_eq!(got.event, "message.created");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let broker = InProcessBroker::default();
        broker.publish("chat-empty", "message.created", "{}").await.unwrap();
    }

    #[tokio::test]
    async fn drop_unsubscribes_and_reaps_channel() {
        let broker = Arc::new(InProcessBroker::default());
        let sub_a = broker.subscribe("chat-t1");
        let sub_b = broker.subscribe("chat-t1");
        assert_eq!(broker.channel_count(), 1);

        drop(sub_a);
        assert_eq!(broker.channel_count(), 1, "one subscriber remains");

        drop(sub_b);
        assert_eq!(broker.channel_count(), 0, "last drop reaps the channel");
    }

    #[tokio::test]
    async fn duplicate_publish_is_delivered_twice() {
        // At-least-once: the broker never dedupes; that is the consumer's
        // job (by message id).
        let broker = Arc::new(InProcessBroker::default());
        let mut sub = broker.subscribe("chat-t1");

        broker.publish("chat-t1", "message.created", r#"{"id":"m1"}"#).await.unwrap();
        broker.publish("chat-t1", "message.created", r#"{"id":"m1"}"#).await.unwrap();

        assert_eq!(sub.recv().await.unwrap().payload, r#"{"id":"m1"}"#);
        assert_eq!(sub.recv().await.unwrap().payload, r#"{"id":"m1"}"#);
    }
}
