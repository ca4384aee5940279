mod add_chain;
mod chain_id;
mod networks_state;
mod provider_state;

pub use add_chain::AddEthereumChainHandler;
pub use chain_id::ChainIdHandler;
pub use networks_state::GetNetworksStateHandler;
pub use provider_state::GetProviderStateHandler;
