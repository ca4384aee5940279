//! # Action / Approval State Machine
//!
//! Requests that need user consent become [`Action`](shared_types::Action)s.
//!
//! ```text
//! CREATED ──▶ DISPLAYED ──▶ APPROVED ──┐
//!                 │                    ├──▶ RESOLVED (record deleted)
//!                 └───────▶ REJECTED ──┘
//! ```
//!
//! - `add_action` persists the action and opens (or focuses) its approval
//!   window.
//! - `update_action` records the user's decision *before* running the owning
//!   handler's callback, so a second decision finds nothing pending.
//! - The callback settles the action through an
//!   [`ActionResolver`](wb_02_dispatch::ActionResolver); the resulting
//!   terminal response goes to the original connection under the original
//!   request id. Settlement runs on its own task, so it completes even if the
//!   approval connection that sent the decision goes away.
//! - Closing the approval window rejects whatever is still pending in it.

pub mod adapters;
pub mod cleanup;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod service;

pub use adapters::memory::InMemoryWindows;
pub use cleanup::cleanup_task;
pub use domain::stats::ActionStats;
pub use domain::update::ActionUpdate;
pub use error::{ActionError, ActionResult};
pub use handlers::{GetActionHandler, UpdateActionHandler};
pub use ports::{ActionCallbacks, ApprovalWindow};
pub use service::ActionService;
