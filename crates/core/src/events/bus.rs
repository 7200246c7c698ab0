use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::ContentEvent;

/// In-process event bus backed by `tokio::broadcast`.
/// Single-node only.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<ContentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ContentEvent) -> Result<usize, broadcast::error::SendError<ContentEvent>> {
        self.sender.send(event)
    }

    /// Publish, treating "nobody is listening" as a non-event.
    pub fn emit(&self, event: ContentEvent) {
        if let Err(broadcast::error::SendError(event)) = self.publish(event) {
            tracing::trace!(?event, "no subscribers for content event");
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ContentEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
