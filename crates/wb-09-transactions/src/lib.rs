//! # Transactions
//!
//! Tracks transactions from creation to a hash or an error. Nothing is
//! persisted; a restart forgets unfinished transactions.
//!
//! ```text
//! new/pending ──(status: submitting)──▶ signing ──▶ finalized { txHash | error }
//! ```
//!
//! `transactions_updateTransaction` with a `submitting` status answers only
//! once the transaction is finalized.

pub mod domain;
pub mod error;
pub mod handlers;
pub mod service;

pub use domain::{Transaction, TxParams, TxParamsPatch, TxStatus, TxUpdate};
pub use error::{TransactionError, TransactionResult};
pub use handlers::UpdateTransactionHandler;
pub use service::TransactionsService;
