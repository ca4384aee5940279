//! Cross-crate flows.

mod approvals;
mod dispatch;
mod runtime;
