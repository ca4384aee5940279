//! # Wallet Background Runtime
//!
//! Library side of the `wb-runtime` binary, exposed for integration tests.
//!
//! ## Modules
//!
//! - `config` - `RuntimeConfig` loaded from TOML and the environment
//! - `container` - builds and wires every service
//! - `adapters` - host implementations of the service ports
//! - `server` - WebSocket endpoint bridged onto the transport
//! - `forwarding` - bus events pushed to live connections

pub mod adapters;
pub mod config;
pub mod container;
pub mod forwarding;
pub mod server;

pub use config::{ConfigError, RuntimeConfig};
pub use container::ServiceContainer;
pub use forwarding::EventForwarder;
