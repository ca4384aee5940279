//! # Swap
//!
//! Executes a quoted swap: checks the ERC-20 allowance of the aggregator's
//! spender, sends an `approve` when it is short, asks the aggregator to build
//! the swap transaction and hands it to the wallet to sign and broadcast.
//!
//! Only the transaction build is retried, and only while the aggregator
//! reports `Server too busy` (see [`RetryPolicy`]).

pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod retry;

pub use domain::amounts::{allowance_calldata, apply_slippage, approve_calldata, slippage_bps};
pub use domain::params::{PriceRoute, Side, SwapParams, AVAX_SYMBOL, ETHER_ADDRESS};
pub use error::{SwapError, SwapResult};
pub use handlers::PerformSwapHandler;
pub use ports::{BuildTxRequest, SwapService, TxBuildData};
pub use retry::RetryPolicy;
