//! # Adapters
//!
//! Host-side implementations of the service ports.
//!
//! - `file_store` - `KeyValueStore` over one JSON file
//! - `windows` - `ApprovalWindow` that asks the host through the event bus
//! - `json_rpc` - EVM JSON-RPC client and the `ChainIdProbe` built on it
//! - `signer` - `WalletService` over a remote signer
//! - `swap_api` - `SwapService` over a DEX aggregator API

pub mod file_store;
pub mod json_rpc;
pub mod signer;
pub mod swap_api;
pub mod windows;

pub use file_store::JsonFileStore;
pub use json_rpc::{JsonRpcClient, RpcChainIdProbe};
pub use signer::RemoteSigner;
pub use swap_api::HttpSwapService;
pub use windows::BusWindows;
