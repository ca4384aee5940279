//! # Wallet
//!
//! The signing side of the wallet is an external collaborator reached through
//! the [`WalletService`] port; no key material lives in this process.
//!
//! [`SignMessageHandler`] serves the six message-signing methods:
//!
//! | Method | Params |
//! |--------|--------|
//! | `eth_sign` | `[from, data]` |
//! | `personal_sign` | `[data, from]` |
//! | `eth_signTypedData`, `eth_signTypedData_v1` | `[data, from]` |
//! | `eth_signTypedData_v3`, `eth_signTypedData_v4` | `[from, data]` |
//!
//! Every request is validated before an approval is opened; the signature is
//! only requested once the user approves.

pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;

pub use domain::message::{MessageParams, MessageType};
pub use domain::tx::{CustomTx, WalletType};
pub use domain::typed_data::{ensure_message_format_is_valid, validate_typed_data};
pub use error::{WalletError, WalletResult};
pub use handlers::SignMessageHandler;
pub use ports::WalletService;
