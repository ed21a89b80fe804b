use super::{ExecutionEvent, ExecutionEventListener};
use crate::command::CommandKey;
use tokio::sync::broadcast;

/// Fan-out of execution events to any number of async subscribers
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub command_key: CommandKey,
    pub event: ExecutionEvent,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, command_key: &CommandKey, event: ExecutionEvent) {
        let published = PublishedEvent {
            command_key: command_key.clone(),
            event,
            published_at: chrono::Utc::now(),
        };

        // No subscribers is fine; events are dropped
        let _ = self.sender.send(published);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ExecutionEventListener for EventPublisher {
    fn on_event(&self, command_key: &CommandKey, event: ExecutionEvent) {
        self.publish(command_key, event);
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}
