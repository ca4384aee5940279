//! # Message Transport Adapter
//!
//! Bridges named, bidirectional connections (one per extension page or dApp
//! tab) to the request pipeline.
//!
//! ## Responsibilities
//!
//! - Classify each connection by name: the trusted extension UI, the approval
//!   surface, or a dApp provider.
//! - Parse inbound frames into [`Request`](shared_types::Request)s and run each
//!   in its own task so a slow request never blocks the connection.
//! - Track in-flight request ids so that, per id, the deferred acknowledgement
//!   always precedes the terminal answer and at most one terminal answer is
//!   ever written.
//! - Deliver late (post-approval) responses and pushed events by
//!   [`ConnectionId`](shared_types::ConnectionId).
//!
//! ## Lifecycle
//!
//! ```text
//! register ──▶ serve_connection ──(stream ends)──▶ disconnect
//!                  │                                   │
//!                  └─ per-request tasks ◀── aborted ───┘
//! ```
//!
//! After disconnect every send to the connection is discarded.

pub mod adapters;
pub mod connection;
pub mod domain;
pub mod error;
pub mod ports;
pub mod registry;
pub mod service;

pub use adapters::memory::InMemoryPort;
pub use connection::Connection;
pub use domain::inflight::{DropReason, InFlightTable};
pub use domain::message::{ConnectionEvent, ConnectionKind, ConnectionNames, OutboundMessage, SenderInfo};
pub use error::TransportError;
pub use ports::inbound::MessageHandler;
pub use ports::outbound::ResponseSink;
pub use registry::ConnectionRegistry;
pub use service::{serve_connection, TransportConfig};
