//! # Test Harness
//!
//! Every service wired the way the runtime wires them, over in-memory
//! storage, in-memory approval windows, a stub signer and an RPC probe that
//! reads the chain id from the last URL segment.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use shared_bus::InMemoryEventBus;
use shared_types::{Account, AccountKind, Action, InMemoryStore, Network, NetworkToken, Request, StorageService, SystemTimeSource};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use wb_01_transport::{ConnectionRegistry, InMemoryPort, SenderInfo, TransportConfig};
use wb_02_dispatch::{HandlerRegistry, Pipeline, RegistryError, TrustedOrigins};
use wb_03_actions::{ActionService, GetActionHandler, InMemoryWindows, UpdateActionHandler};
use wb_04_permissions::{
    AccountsHandler, GetAllPermissionsHandler, PermissionsGate, PermissionsService, RequestAccountsHandler,
    RevokeDomainAccessHandler, SendDomainMetadataHandler,
};
use wb_05_network::{
    AddEthereumChainHandler, ChainIdHandler, ChainIdProbe, GetNetworksStateHandler, GetProviderStateHandler,
    NetworkError, NetworkResult, NetworkService,
};
use wb_06_accounts::{AccountsApi, AccountsService, GetAccountsHandler, SelectAccountHandler};
use wb_07_wallet::{CustomTx, MessageType, SignMessageHandler, WalletResult, WalletService, WalletType};
use wb_09_transactions::{TransactionsService, UpdateTransactionHandler};

pub const C_CHAIN: u64 = 43114;
pub const FUJI: u64 = 43113;
pub const DAPP_URL: &str = "https://app.example/swap";
pub const DAPP_DOMAIN: &str = "app.example";
pub const TRUSTED_DOMAIN: &str = "core.app";

/// Chain id is the last path segment of the RPC url.
pub struct PathProbe;

#[async_trait]
impl ChainIdProbe for PathProbe {
    async fn chain_id(&self, rpc_url: &str, _headers: Option<&BTreeMap<String, String>>) -> NetworkResult<u64> {
        rpc_url
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse().ok())
            .ok_or_else(|| NetworkError::Probe(format!("unreachable {rpc_url}")))
    }
}

/// Signer that signs everything with a fixed signature.
///
/// With `hold_signing` set, each signature waits for `release`.
#[derive(Default)]
pub struct StubWallet {
    pub wallet_type: Mutex<Option<WalletType>>,
    pub signed: Mutex<Vec<(MessageType, Value)>>,
    pub sent: Mutex<Vec<CustomTx>>,
    pub hold_signing: AtomicBool,
    pub release: Notify,
}

impl StubWallet {
    pub fn set_type(&self, wallet_type: Option<WalletType>) {
        *self.wallet_type.lock() = wallet_type;
    }
}

#[async_trait]
impl WalletService for StubWallet {
    async fn wallet_type(&self) -> Option<WalletType> {
        *self.wallet_type.lock()
    }

    async fn c_address(&self) -> Option<String> {
        Some("0xabc".into())
    }

    async fn sign_message(&self, kind: MessageType, action: &Action) -> WalletResult<String> {
        if self.hold_signing.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        self.signed.lock().push((kind, action.display_data.clone()));
        Ok("0xsigned".into())
    }

    async fn send_custom_tx(&self, tx: CustomTx) -> WalletResult<String> {
        self.sent.lock().push(tx);
        Ok("0xhash".into())
    }
}

pub fn network(chain_id: u64, name: &str, is_testnet: bool) -> Network {
    Network {
        chain_id,
        chain_name: name.into(),
        rpc_url: format!("https://rpc.example/{chain_id}"),
        network_token: NetworkToken {
            symbol: "AVAX".into(),
            decimals: 18,
            name: "Avalanche".into(),
            ..Default::default()
        },
        is_testnet,
        ..Default::default()
    }
}

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub registry: Arc<ConnectionRegistry>,
    pub windows: Arc<InMemoryWindows>,
    pub actions: Arc<ActionService>,
    pub accounts: Arc<AccountsService>,
    pub permissions: Arc<PermissionsService>,
    pub networks: Arc<NetworkService>,
    pub wallet: Arc<StubWallet>,
    pub transactions: Arc<TransactionsService>,
    pub pipeline: Arc<Pipeline>,
}

impl Harness {
    pub fn new() -> Self {
        Self::on_store(Arc::new(InMemoryStore::new()))
    }

    pub fn on_store(store: Arc<InMemoryStore>) -> Self {
        let storage = StorageService::new(store.clone());
        let bus = Arc::new(InMemoryEventBus::new());
        let registry = Arc::new(ConnectionRegistry::default());
        let windows = Arc::new(InMemoryWindows::new());
        let actions = Arc::new(ActionService::new(
            storage.clone(),
            windows.clone(),
            registry.clone(),
            bus.clone(),
            Arc::new(SystemTimeSource),
        ));
        let accounts = Arc::new(AccountsService::new(storage.clone(), bus.clone()));
        let permissions = Arc::new(PermissionsService::new(storage.clone(), bus.clone()));
        let supported = [(C_CHAIN, network(C_CHAIN, "Avalanche C-Chain", false)), (FUJI, network(FUJI, "Avalanche Fuji", true))]
            .into_iter()
            .collect();
        let networks = Arc::new(NetworkService::new(storage, bus.clone(), Arc::new(PathProbe), supported, C_CHAIN));
        let wallet = Arc::new(StubWallet::default());
        let transactions = Arc::new(TransactionsService::new(wallet.clone(), bus.clone()));
        let gate = Arc::new(PermissionsGate::new(permissions.clone(), accounts.clone()));

        let (extension, dapp) = registries(&actions, &accounts, &permissions, &networks, &wallet, &transactions)
            .expect("handler methods are unique");
        let pipeline = Arc::new(Pipeline::new(extension, dapp, gate));
        actions.attach(pipeline.clone()).expect("attached once");

        Self {
            store,
            bus,
            registry,
            windows,
            actions,
            accounts,
            permissions,
            networks,
            wallet,
            transactions,
            pipeline,
        }
    }

    pub fn extension(&self) -> InMemoryPort {
        self.connect("extension", SenderInfo::default())
    }

    pub fn dapp(&self, url: &str) -> InMemoryPort {
        self.connect("provider", SenderInfo::new(Some(7), Some(url.to_string())))
    }

    fn connect(&self, name: &str, sender: SenderInfo) -> InMemoryPort {
        InMemoryPort::connect(
            self.registry.clone(),
            name,
            sender,
            self.pipeline.clone(),
            TransportConfig::default(),
        )
        .expect("known connection name")
    }

    /// Add an account; the first one becomes active.
    pub async fn add_account(&self, address: &str) -> Account {
        self.accounts
            .add_account("Account", address, AccountKind::Primary)
            .await
            .expect("account added")
    }

    /// Connect `domain` to the active account.
    pub async fn grant(&self, domain: &str, address: &str) {
        self.permissions.grant(domain, address).await.expect("granted");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the two registries exactly as the runtime does, minus swap.
pub fn registries(
    actions: &Arc<ActionService>,
    accounts: &Arc<AccountsService>,
    permissions: &Arc<PermissionsService>,
    networks: &Arc<NetworkService>,
    wallet: &Arc<StubWallet>,
    transactions: &Arc<TransactionsService>,
) -> Result<(HandlerRegistry, HandlerRegistry), RegistryError> {
    let chain_id = Arc::new(ChainIdHandler::new(networks.clone()));
    let provider_state = Arc::new(GetProviderStateHandler::new(networks.clone(), accounts.clone()));
    let dapp = HandlerRegistry::builder()
        .register(Arc::new(RequestAccountsHandler::new(permissions.clone(), accounts.clone(), actions.clone())))?
        .register(Arc::new(AccountsHandler::new(accounts.clone())))?
        .register(chain_id.clone())?
        .register(provider_state.clone())?
        .register(Arc::new(SendDomainMetadataHandler::new(permissions.clone())))?
        .register(Arc::new(AddEthereumChainHandler::new(
            networks.clone(),
            actions.clone(),
            TrustedOrigins::new([TRUSTED_DOMAIN]),
        )))?
        .register(Arc::new(SignMessageHandler::new(wallet.clone(), networks.clone(), actions.clone())))?
        .build();
    let extension = HandlerRegistry::builder()
        .register(chain_id)?
        .register(provider_state)?
        .register(Arc::new(GetAllPermissionsHandler::new(permissions.clone())))?
        .register(Arc::new(RevokeDomainAccessHandler::new(permissions.clone())))?
        .register(Arc::new(GetNetworksStateHandler::new(networks.clone())))?
        .register(Arc::new(SelectAccountHandler::new(accounts.clone())))?
        .register(Arc::new(GetAccountsHandler::new(accounts.clone())))?
        .register(Arc::new(GetActionHandler::new(actions.clone())))?
        .register(Arc::new(UpdateActionHandler::new(actions.clone())))?
        .register(Arc::new(UpdateTransactionHandler::new(transactions.clone())))?
        .build();
    Ok((extension, dapp))
}

/// Send `request` and wait for the next response frame.
pub async fn call(port: &mut InMemoryPort, request: Request) -> Value {
    port.send(&request).expect("port open");
    next(port).await
}

/// Next response frame, bounded so a missing answer fails instead of hanging.
pub async fn next(port: &mut InMemoryPort) -> Value {
    tokio::time::timeout(std::time::Duration::from_secs(5), port.next_response())
        .await
        .expect("response within 5s")
        .expect("connection open")
}
