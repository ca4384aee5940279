//! # Event Publisher
//!
//! Publishing side of the event bus.

use crate::events::{EventFilter, WalletEvent};
use crate::subscriber::{EventSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

/// Interface services use to announce state changes.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event, returning the number of subscribers that received it.
    async fn publish(&self, event: WalletEvent) -> usize;
}

/// In-process event bus over `tokio::sync::broadcast`.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<WalletEvent>,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to events matching a filter.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        debug!(topics = ?filter.topics, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: WalletEvent) -> usize {
        let topic = event.topic();
        let source = event.source();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(
                    topic = ?topic,
                    source = source,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(_) => {
                debug!(topic = ?topic, source = source, "Event dropped (no receivers)");
                0
            }
        }
    }
}
