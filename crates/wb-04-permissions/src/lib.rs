//! # Permissions
//!
//! Which dApp domains may see which accounts.
//!
//! - [`PermissionsService`] owns the `permissions` storage key, caches it and
//!   publishes every change on the bus.
//! - [`PermissionsGate`] answers the pipeline's "is this domain connected?"
//!   question against the *active* account.
//! - The handlers implement the connect flow (`eth_requestAccounts`) and the
//!   connected-sites page.

pub mod error;
pub mod gate;
pub mod handlers;
pub mod ports;
pub mod service;

pub use error::{PermissionsError, PermissionsResult};
pub use gate::PermissionsGate;
pub use handlers::{
    AccountsHandler, GetAllPermissionsHandler, RequestAccountsHandler, RevokeDomainAccessHandler,
    SendDomainMetadataHandler,
};
pub use ports::ActiveAccountProvider;
pub use service::{PermissionsService, SiteMetadata};
