use tokio::sync::broadcast;
use tracing::debug;

use crate::models::ScrapeSource;

const EVENT_CAPACITY: usize = 64;

/// Notifications published by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    ChatCreated {
        chat_id: String,
        user_id: String,
        title: String,
    },
    TurnCompleted {
        chat_id: String,
        product_count: usize,
        source: ScrapeSource,
    },
}

/// Broadcast channel for [`ChatEvent`]s. Publishing with no subscriber is fine.
#[derive(Clone)]
pub struct ChatEvents {
    sender: broadcast::Sender<ChatEvent>,
}

impl ChatEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ChatEvent) {
        if self.sender.send(event).is_err() {
            debug!("No chat event subscribers");
        }
    }
}

impl Default for ChatEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let events = ChatEvents::new();
        let mut receiver = events.subscribe();

        events.publish(ChatEvent::ChatCreated {
            chat_id: "c1".to_string(),
            user_id: "u1".to_string(),
            title: "hello".to_string(),
        });

        match receiver.recv().await.unwrap() {
            ChatEvent::ChatCreated { chat_id, .. } => assert_eq!(chat_id, "c1"),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        ChatEvents::new().publish(ChatEvent::TurnCompleted {
            chat_id: "c1".to_string(),
            product_count: 0,
            source: ScrapeSource::Error,
        });
    }
}
