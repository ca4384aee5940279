//! # Service Container
//!
//! Builds every service once and wires them through their ports.
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: storage, event bus, upstream clients, connection registry
//! Phase 2: actions (needs registry as its response sink)
//! Phase 3: accounts, permissions, networks, wallet, transactions
//! Phase 4: handler registries and the pipeline, attached back to actions
//! ```
//!
//! [`ServiceContainer::start`] then restores persisted state and spawns the
//! background tasks.

use crate::adapters::{BusWindows, HttpSwapService, JsonFileStore, JsonRpcClient, RemoteSigner, RpcChainIdProbe};
use crate::config::RuntimeConfig;
use crate::forwarding::EventForwarder;
use anyhow::{Context, Result};
use shared_bus::{EventFilter, InMemoryEventBus};
use shared_types::{KeyValueStore, StorageService, SystemTimeSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use url::Url;
use wb_01_transport::{ConnectionRegistry, TransportConfig};
use wb_02_dispatch::{HandlerRegistry, Pipeline, TrustedOrigins};
use wb_03_actions::{cleanup_task, ActionService, GetActionHandler, UpdateActionHandler};
use wb_04_permissions::{
    AccountsHandler, GetAllPermissionsHandler, PermissionsGate, PermissionsService, RequestAccountsHandler,
    RevokeDomainAccessHandler, SendDomainMetadataHandler,
};
use wb_05_network::{
    AddEthereumChainHandler, ChainIdHandler, GetNetworksStateHandler, GetProviderStateHandler, NetworkService,
};
use wb_06_accounts::{AccountsService, GetAccountsHandler, SelectAccountHandler};
use wb_07_wallet::{SignMessageHandler, WalletService};
use wb_08_swap::{PerformSwapHandler, RetryPolicy};
use wb_09_transactions::{TransactionsService, UpdateTransactionHandler};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Every long-lived service of the process.
pub struct ServiceContainer {
    // =========================================================================
    // SHARED INFRASTRUCTURE
    // =========================================================================
    pub event_bus: Arc<InMemoryEventBus>,
    /// Live connections; also the response sink for deferred answers.
    pub connections: Arc<ConnectionRegistry>,
    pub windows: Arc<BusWindows>,

    // =========================================================================
    // SERVICES
    // =========================================================================
    pub actions: Arc<ActionService>,
    pub accounts: Arc<AccountsService>,
    pub permissions: Arc<PermissionsService>,
    pub gate: Arc<PermissionsGate>,
    pub networks: Arc<NetworkService>,
    pub wallet: Arc<dyn WalletService>,
    pub transactions: Arc<TransactionsService>,

    // =========================================================================
    // DISPATCH
    // =========================================================================
    pub pipeline: Arc<Pipeline>,

    /// Immutable after initialization.
    pub config: RuntimeConfig,
}

impl ServiceContainer {
    /// Build the container over the configured data file.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(config.storage.data_file.clone()));
        Self::with_store(config, store)
    }

    /// Build the container over any key/value backend.
    #[instrument(name = "container_init", skip_all)]
    pub fn with_store(config: RuntimeConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        // =====================================================================
        // PHASE 1: Shared infrastructure
        // =====================================================================
        let storage = StorageService::new(store);
        let event_bus = Arc::new(InMemoryEventBus::new());
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        let rpc = JsonRpcClient::new(http.clone());
        let connections = Arc::new(ConnectionRegistry::new(config.connection_names()));
        let windows = Arc::new(BusWindows::new(event_bus.clone()));
        info!("Phase 1: shared infrastructure ready");

        // =====================================================================
        // PHASE 2: Actions
        // =====================================================================
        let actions = Arc::new(ActionService::new(
            storage.clone(),
            windows.clone(),
            connections.clone(),
            event_bus.clone(),
            Arc::new(SystemTimeSource),
        ));

        // =====================================================================
        // PHASE 3: Domain services
        // =====================================================================
        let accounts = Arc::new(AccountsService::new(storage.clone(), event_bus.clone()));
        let permissions = Arc::new(PermissionsService::new(storage.clone(), event_bus.clone()));
        let gate = Arc::new(PermissionsGate::new(permissions.clone(), accounts.clone()));
        let networks = Arc::new(NetworkService::new(
            storage,
            event_bus.clone(),
            Arc::new(RpcChainIdProbe::new(rpc.clone())),
            config.supported_chains(),
            config.networks.default_chain,
        ));
        let signer_url = optional_base_url(config.signer.url.as_deref()).context("signer.url")?;
        if signer_url.is_none() {
            warn!("No signer configured, signing requests will fail with `wallet undefined`");
        }
        let wallet: Arc<dyn WalletService> = Arc::new(RemoteSigner::new(http.clone(), signer_url));
        let transactions = Arc::new(TransactionsService::new(wallet.clone(), event_bus.clone()));
        info!("Phase 3: services ready");

        // =====================================================================
        // PHASE 4: Dispatch
        // =====================================================================
        let trusted = TrustedOrigins::new(config.trust.first_party_domains.iter().cloned());
        let provider_state = Arc::new(GetProviderStateHandler::new(networks.clone(), accounts.clone()));
        let chain_id = Arc::new(ChainIdHandler::new(networks.clone()));

        let dapp = HandlerRegistry::builder()
            .register(Arc::new(RequestAccountsHandler::new(
                permissions.clone(),
                accounts.clone(),
                actions.clone(),
            )))?
            .register(Arc::new(AccountsHandler::new(accounts.clone())))?
            .register(chain_id.clone())?
            .register(provider_state.clone())?
            .register(Arc::new(SendDomainMetadataHandler::new(permissions.clone())))?
            .register(Arc::new(AddEthereumChainHandler::new(
                networks.clone(),
                actions.clone(),
                trusted,
            )))?
            .register(Arc::new(SignMessageHandler::new(
                wallet.clone(),
                networks.clone(),
                actions.clone(),
            )))?
            .build();

        let mut extension = HandlerRegistry::builder()
            .register(chain_id)?
            .register(provider_state)?
            .register(Arc::new(GetAllPermissionsHandler::new(permissions.clone())))?
            .register(Arc::new(RevokeDomainAccessHandler::new(permissions.clone())))?
            .register(Arc::new(GetNetworksStateHandler::new(networks.clone())))?
            .register(Arc::new(SelectAccountHandler::new(accounts.clone())))?
            .register(Arc::new(GetAccountsHandler::new(accounts.clone())))?
            .register(Arc::new(GetActionHandler::new(actions.clone())))?
            .register(Arc::new(UpdateActionHandler::new(actions.clone())))?
            .register(Arc::new(UpdateTransactionHandler::new(transactions.clone())))?;
        match optional_base_url(config.swap.url.as_deref()).context("swap.url")? {
            Some(api) => {
                let swap = Arc::new(HttpSwapService::new(http, api, rpc, networks.clone()));
                let retry = RetryPolicy {
                    max_attempts: config.swap.max_attempts.max(1),
                    ..RetryPolicy::default()
                };
                extension = extension.register(Arc::new(PerformSwapHandler::new(
                    swap,
                    networks.clone(),
                    wallet.clone(),
                    retry,
                )))?;
            }
            None => info!("No swap aggregator configured, swap_performSwap disabled"),
        }
        let extension = extension.build();

        info!(
            dapp_methods = dapp.len(),
            extension_methods = extension.len(),
            "Phase 4: handler registries built"
        );
        let pipeline = Arc::new(Pipeline::new(extension, dapp, gate.clone()));
        actions
            .attach(pipeline.clone())
            .context("failed to attach handler lookup to the action service")?;

        Ok(Self {
            event_bus,
            connections,
            windows,
            actions,
            accounts,
            permissions,
            gate,
            networks,
            wallet,
            transactions,
            pipeline,
            config,
        })
    }

    /// Restore persisted state and spawn the background tasks.
    pub async fn start(&self) -> Result<Vec<JoinHandle<()>>> {
        let purged = self
            .actions
            .purge_stale()
            .await
            .context("failed to purge stale actions")?;
        if purged > 0 {
            info!(purged = purged, "Dropped actions left over from the previous run");
        }
        match self.networks.init().await.context("failed to restore network state")? {
            Some(network) => info!(chain_id = network.chain_id, "Network state restored"),
            None => warn!("No active network"),
        }

        let mut tasks = Vec::new();
        let forwarder = EventForwarder::new(self.connections.clone(), self.gate.clone());
        tasks.push(tokio::spawn(
            forwarder.run(self.event_bus.subscribe(EventFilter::all())),
        ));

        if let Some(max_age) = self.config.actions.max_pending_age_secs {
            tasks.push(tokio::spawn(cleanup_task(
                self.actions.clone(),
                self.config.actions.cleanup_interval(),
                max_age,
            )));
            info!(max_age_secs = max_age, "Action expiry enabled");
        }
        Ok(tasks)
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            max_message_size: self.config.server.max_message_size,
        }
    }
}

/// Parse an upstream base url so that relative joins stay beneath it.
fn optional_base_url(raw: Option<&str>) -> Result<Option<Url>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut url = Url::parse(raw).with_context(|| format!("invalid url {raw}"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(Some(url))
}
