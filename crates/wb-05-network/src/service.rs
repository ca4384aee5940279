//! Network store.

use crate::error::{NetworkError, NetworkResult};
use crate::ports::ChainIdProbe;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use shared_bus::{EventPublisher, WalletEvent};
use shared_types::{keys, ChainList, Network, StorageService};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// RPC headers added on top of a network's own, by chain id.
pub type NetworkOverrides = BTreeMap<u64, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default)]
struct NetworkState {
    active: Option<u64>,
    custom: ChainList,
    overrides: NetworkOverrides,
}

pub struct NetworkService {
    storage: StorageService,
    events: Arc<dyn EventPublisher>,
    probe: Arc<dyn ChainIdProbe>,
    supported: ChainList,
    default_chain: u64,
    state: RwLock<Option<NetworkState>>,
    write_gate: tokio::sync::Mutex<()>,
}

impl NetworkService {
    /// `supported` are the built-in networks; `default_chain` is activated
    /// when nothing was persisted.
    pub fn new(
        storage: StorageService,
        events: Arc<dyn EventPublisher>,
        probe: Arc<dyn ChainIdProbe>,
        supported: ChainList,
        default_chain: u64,
    ) -> Self {
        Self {
            storage,
            events,
            probe,
            supported,
            default_chain,
            state: RwLock::new(None),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Load persisted state and announce the active network.
    pub async fn init(&self) -> NetworkResult<Option<Network>> {
        let state = self.load_state().await?;
        let active = self.resolve_active(&state);
        match &active {
            Some(network) => {
                info!(chain_id = network.chain_id, name = %network.chain_name, "Active network restored");
                self.events
                    .publish(WalletEvent::NetworkChanged(network.clone()))
                    .await;
            }
            None => warn!(chain_id = self.default_chain, "Default network is not configured"),
        }
        Ok(active)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub async fn active_network(&self) -> NetworkResult<Option<Network>> {
        let state = self.load_state().await?;
        Ok(self.resolve_active(&state))
    }

    /// Built-in and custom networks with overrides applied.
    pub async fn all_networks(&self) -> NetworkResult<ChainList> {
        let state = self.load_state().await?;
        Ok(self.merge(&state))
    }

    pub fn supported_networks(&self) -> &ChainList {
        &self.supported
    }

    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.supported.contains_key(&chain_id)
    }

    pub async fn custom_networks(&self) -> NetworkResult<ChainList> {
        Ok(self.load_state().await?.custom)
    }

    pub async fn network_overrides(&self) -> NetworkResult<NetworkOverrides> {
        Ok(self.load_state().await?.overrides)
    }

    pub async fn is_mainnet(&self) -> NetworkResult<bool> {
        Ok(self
            .active_network()
            .await?
            .is_some_and(|network| !network.is_testnet))
    }

    pub async fn is_developer_mode(&self) -> NetworkResult<bool> {
        Ok(self
            .active_network()
            .await?
            .is_some_and(|network| network.is_testnet))
    }

    /// Does the endpoint at `rpc_url` serve `chain_id`?
    pub async fn is_valid_rpc_url(
        &self,
        chain_id: u64,
        rpc_url: &str,
        headers: Option<&BTreeMap<String, String>>,
    ) -> bool {
        match self.probe.chain_id(rpc_url, headers).await {
            Ok(reported) => {
                debug!(rpc_url = rpc_url, expected = chain_id, reported = reported, "RPC probed");
                reported == chain_id
            }
            Err(e) => {
                warn!(rpc_url = rpc_url, error = %e, "RPC probe failed");
                false
            }
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    pub async fn set_network(&self, chain_id: u64) -> NetworkResult<Network> {
        let _gate = self.write_gate.lock().await;
        let mut state = self.load_state().await?;
        let network = self
            .merge(&state)
            .remove(&chain_id)
            .ok_or(NetworkError::Unsupported(chain_id))?;

        state.active = Some(chain_id);
        self.persist(keys::NETWORK, &chain_id, state).await?;
        info!(chain_id = chain_id, name = %network.chain_name, "Active network changed");
        self.events
            .publish(WalletEvent::NetworkChanged(network.clone()))
            .await;
        Ok(network)
    }

    /// Store a user-added network and make it active.
    pub async fn save_custom_network(&self, network: Network) -> NetworkResult<Network> {
        let chain_id = network.chain_id;
        {
            let _gate = self.write_gate.lock().await;
            let mut state = self.load_state().await?;
            state.custom.insert(chain_id, network);
            let custom = state.custom.clone();
            self.persist(keys::CUSTOM_NETWORKS, &custom, state).await?;
            info!(chain_id = chain_id, "Custom network saved");
            self.events
                .publish(WalletEvent::CustomNetworksUpdated(custom))
                .await;
        }
        self.set_network(chain_id).await
    }

    pub async fn remove_custom_network(&self, chain_id: u64) -> NetworkResult<bool> {
        let _gate = self.write_gate.lock().await;
        let mut state = self.load_state().await?;
        if state.custom.remove(&chain_id).is_none() {
            return Ok(false);
        }
        let custom = state.custom.clone();
        self.persist(keys::CUSTOM_NETWORKS, &custom, state).await?;
        info!(chain_id = chain_id, "Custom network removed");
        self.events
            .publish(WalletEvent::CustomNetworksUpdated(custom))
            .await;
        Ok(true)
    }

    /// Remember the custom RPC headers requested for `network`. The RPC URL is
    /// never overridden this way.
    pub async fn update_network_overrides(&self, network: &Network) -> NetworkResult<()> {
        let Some(headers) = network.custom_rpc_headers.clone() else {
            return Ok(());
        };
        let _gate = self.write_gate.lock().await;
        let mut state = self.load_state().await?;
        state.overrides.insert(network.chain_id, headers);
        let overrides = state.overrides.clone();
        self.persist(keys::NETWORK_OVERRIDES, &overrides, state).await?;
        debug!(chain_id = network.chain_id, "Network overrides updated");
        Ok(())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn merge(&self, state: &NetworkState) -> ChainList {
        let mut all = self.supported.clone();
        all.extend(state.custom.iter().map(|(id, network)| (*id, network.clone())));
        for (id, headers) in &state.overrides {
            if let Some(network) = all.get_mut(id) {
                network.custom_rpc_headers = Some(headers.clone());
            }
        }
        all
    }

    fn resolve_active(&self, state: &NetworkState) -> Option<Network> {
        let mut all = self.merge(state);
        state
            .active
            .and_then(|id| all.remove(&id))
            .or_else(|| all.remove(&self.default_chain))
    }

    async fn load_state(&self) -> NetworkResult<NetworkState> {
        if let Some(state) = self.state.read().as_ref() {
            return Ok(state.clone());
        }
        let loaded = NetworkState {
            active: self.load_key(keys::NETWORK).await?,
            custom: self.load_key(keys::CUSTOM_NETWORKS).await?.unwrap_or_default(),
            overrides: self.load_key(keys::NETWORK_OVERRIDES).await?.unwrap_or_default(),
        };
        debug!(
            active = ?loaded.active,
            custom = loaded.custom.len(),
            "Loaded network state"
        );
        let mut cache = self.state.write();
        Ok(cache.get_or_insert(loaded).clone())
    }

    async fn load_key<T: DeserializeOwned>(&self, key: &str) -> NetworkResult<Option<T>> {
        Ok(self.storage.load(key).await?)
    }

    async fn persist<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        state: NetworkState,
    ) -> NetworkResult<()> {
        self.storage.save(key, value).await?;
        *self.state.write() = Some(state);
        Ok(())
    }
}
