//! # Shared Bus - Service Event Bus
//!
//! Services publish their state changes here; the runtime fans them out to
//! connected extension pages and to connected dApps.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe()  ┌──────────────┐
//! │   Service    │ ────────────▶ │  Event Bus   │ ────────────▶ │  Forwarder   │
//! └──────────────┘               └──────────────┘               └──────────────┘
//! ```
//!
//! A dropped [`Subscription`] receives nothing more.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, WalletEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventSubscriber, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
