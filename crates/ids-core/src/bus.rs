//! In-process event bus (C6) — a thin wrapper over `tokio::sync::broadcast`,
//! the same primitive the teacher's server wires up as a single shared
//! channel between the API and the gateway. Here it is a named facade rather
//! than a bare channel, and the payload is the closed `Topic` enum instead of
//! a loose `{event_type:String, data:Value}` shape.

use ids_common::events::BusEvent;
use tokio::sync::broadcast;

/// Default channel capacity. A slow subscriber that falls behind this many
/// events loses the oldest ones rather than blocking the publisher — matches
/// the teacher's unbounded-fanout-but-bounded-buffer `broadcast::channel`.
const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// Best-effort publish: if there are no subscribers this is a no-op, and a
    /// subscriber that is lagging never blocks or panics the publisher.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ids_common::events::Topic;
    use uuid::Uuid;

    fn sample(topic: Topic) -> BusEvent {
        BusEvent {
            topic,
            ts: chrono::Utc::now(),
            server_id: Uuid::new_v4(),
            channel_id: None,
            origin_principal: None,
            data: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(sample(Topic::MessageCreated));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, Topic::MessageCreated);
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(sample(Topic::TypingUpdate));
    }
}
