//! # Accounts
//!
//! The wallet's accounts and which one is active. The active account is what
//! the permission gate checks grants against and what connected sites see.
//!
//! Persisted under storage key `accounts` as `{ accounts, active }`.

pub mod error;
pub mod handlers;
pub mod ports;
pub mod service;

pub use error::{AccountsError, AccountsResult};
pub use handlers::{GetAccountsHandler, SelectAccountHandler};
pub use ports::AccountsApi;
pub use service::{AccountsService, AccountsState};
