//! # Networks
//!
//! Owns the active network, the user's custom networks and per-chain RPC
//! overrides.
//!
//! ## Storage keys
//!
//! | Key | Content |
//! |-----|---------|
//! | `network` | active chain id |
//! | `custom_networks` | [`ChainList`](shared_types::ChainList) of user-added chains |
//! | `network_overrides` | extra RPC headers by chain id |
//!
//! ## Handlers
//!
//! - `wallet_addEthereumChain` (EIP-3085): validates the requested chain,
//!   probes its RPC endpoint and asks the user before switching or adding.
//! - `eth_chainId`, `metamask_getProviderState` for dApps.
//! - `networks_getNetworksState` for the extension UI.

pub mod domain;
pub mod error;
pub mod handlers;
pub mod ports;
pub mod service;

pub use domain::{AddEthereumChainParameter, NativeCurrency};
pub use error::{NetworkError, NetworkResult};
pub use handlers::{
    AddEthereumChainHandler, ChainIdHandler, GetNetworksStateHandler, GetProviderStateHandler,
};
pub use ports::ChainIdProbe;
pub use service::NetworkService;
