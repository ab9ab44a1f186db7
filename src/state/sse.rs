use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Broadcast hub fanning events out to every connected SSE client.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers. Returns how many received it.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_sent_after_joining() {
        let hub = SseHub::new(4);
        assert_eq!(hub.broadcast(ServerEvent::new(None, "lost".into())), 0);

        let mut receiver = hub.subscribe();
        let event = ServerEvent::new(Some("match.updated".into()), "{}".into());
        assert_eq!(hub.broadcast(event), 1);

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("match.updated"));
        assert_eq!(received.data, "{}");
    }
}
