//! # Event Subscriber
//!
//! Subscription side of the event bus.

use crate::events::{EventFilter, WalletEvent};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// Source of subscriptions, so consumers need not know the bus type.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// A subscription handle for receiving events.
///
/// Dropping it unregisters the subscriber.
pub struct Subscription {
    receiver: broadcast::Receiver<WalletEvent>,
    filter: EventFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<WalletEvent>, filter: EventFilter) -> Self {
        Self { receiver, filter }
    }

    /// Next event that matches the filter, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<WalletEvent> {
        loop {
            let event = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(lagged = count, "Subscriber lagged, some events dropped");
                    continue;
                }
            };

            if self.filter.matches(&event) {
                return Some(event);
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Result<Option<WalletEvent>, SubscriptionError> {
        loop {
            let event = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if self.filter.matches(&event) {
                return Ok(Some(event));
            }
        }
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!(topics = ?self.filter.topics, "Subscription dropped");
    }
}
