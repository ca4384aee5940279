//! # JSON-RPC Dispatch
//!
//! Routes each request to exactly one handler.
//!
//! ## Pipeline
//!
//! ```text
//! request ──▶ domain classification ──▶ permission gate ──▶ method dispatch
//!             (extension | dApp)        (dApp only)         (registry lookup)
//! ```
//!
//! - Extension-origin requests are trusted and always take the authenticated
//!   path.
//! - dApp-origin requests get their `site` stamped from the connection; a
//!   domain the user has connected takes the authenticated path, anything else
//!   the unauthenticated one (or `4100 unauthorized` for handlers that have no
//!   unauthenticated path).
//! - A handler that needs consent returns [`HandlerOutcome::Deferred`]; the
//!   terminal answer is produced later through an [`ActionResolver`].
//!
//! No handler failure or panic ever escapes as anything but an error response.

pub mod engine;
pub mod error;
pub mod handler;
pub mod pipeline;
pub mod ports;
pub mod registry;
pub mod trust;

pub use engine::{Authentication, DispatchEngine};
pub use error::RegistryError;
pub use handler::{
    ActionOutcome, ActionResolver, HandlerMode, HandlerOutcome, HandlerResult, RequestContext,
    RequestHandler,
};
pub use pipeline::Pipeline;
pub use ports::PermissionGate;
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use trust::TrustedOrigins;
