//! Realtime Hub
//!
//! Fan-out of chat and notification events to WebSocket subscribers.
//! Slow subscribers lag and skip events rather than blocking publishers.

use tokio::sync::broadcast;

use wheels::RealtimeEnvelope;

pub const HUB_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<RealtimeEnvelope>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(HUB_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscribers received the event
    pub fn publish(&self, event: RealtimeEnvelope) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("No realtime subscribers, event dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEnvelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notification(kind: &str) -> RealtimeEnvelope {
        RealtimeEnvelope::Notification {
            kind: kind.into(),
            title: "Payment".into(),
            body: "done".into(),
            data: json!({}),
            recipient_id: None,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let hub = RealtimeHub::default();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        assert_eq!(hub.subscriber_count(), 2);
        assert_eq!(hub.publish(notification("payment_succeeded")), 2);
        assert_eq!(first.recv().await.unwrap(), notification("payment_succeeded"));
        assert_eq!(second.recv().await.unwrap(), notification("payment_succeeded"));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let hub = RealtimeHub::default();
        assert_eq!(hub.publish(notification("payment_failed")), 0);
    }

    #[tokio::test]
    async fn test_lagging_subscriber_skips() {
        let hub = RealtimeHub::new(2);
        let mut rx = hub.subscribe();
        for kind in ["a", "b", "c"] {
            hub.publish(notification(kind));
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(rx.recv().await.unwrap(), notification("b"));
    }
}
