//! `wallet_addEthereumChain` (EIP-3085).

use crate::domain::AddEthereumChainParameter;
use crate::service::NetworkService;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{Action, ChainList, Network, RpcError};
use std::sync::Arc;
use tracing::{debug, info};
use wb_02_dispatch::{
    ActionResolver, HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler,
    TrustedOrigins,
};
use wb_03_actions::ActionService;

pub const VIEW_SWITCH: &str = "network/switch";
pub const VIEW_ADD: &str = "networks/add-popup";

#[derive(Debug, Deserialize)]
struct DisplayedNetwork {
    network: Network,
}

pub struct AddEthereumChainHandler {
    networks: Arc<NetworkService>,
    actions: Arc<ActionService>,
    trusted: TrustedOrigins,
}

impl AddEthereumChainHandler {
    pub fn new(
        networks: Arc<NetworkService>,
        actions: Arc<ActionService>,
        trusted: TrustedOrigins,
    ) -> Self {
        Self {
            networks,
            actions,
            trusted,
        }
    }

    async fn apply(&self, chains: &ChainList, network: &Network) -> Result<(), RpcError> {
        if network.custom_rpc_headers.is_some() {
            self.networks.update_network_overrides(network).await?;
        }
        if chains.contains_key(&network.chain_id) {
            self.networks.set_network(network.chain_id).await?;
        } else {
            self.networks.save_custom_network(network.clone()).await?;
        }
        Ok(())
    }

    async fn handle(&self, ctx: &RequestContext) -> HandlerResult {
        let requested: AddEthereumChainParameter = match ctx.param(0) {
            None | Some(Value::Null) => {
                return Err(RpcError::invalid_params("Chain config missing"));
            }
            Some(raw) => serde_json::from_value(raw.clone())
                .map_err(|e| RpcError::invalid_params(e.to_string()))?,
        };
        let chain_id = requested
            .chain_id()
            .ok_or_else(|| RpcError::invalid_params("Invalid chainId"))?;

        let chains = self.networks.all_networks().await?;
        let active = self.networks.active_network().await?;
        if active.as_ref().is_some_and(|n| n.chain_id == chain_id) {
            debug!(chain_id = chain_id, "Requested chain already active");
            return Ok(HandlerOutcome::Result(Value::Null));
        }

        let rpc_url = requested
            .rpc_url()
            .ok_or_else(|| RpcError::invalid_params("RPC url missing"))?;
        let currency = requested
            .native_currency
            .as_ref()
            .ok_or_else(|| RpcError::invalid_params("Expected nativeCurrency param to be defined"))?;

        let network = requested.to_network(chain_id, rpc_url, currency);
        if network.chain_name.is_empty() {
            return Err(RpcError::invalid_params("Network Name is required"));
        }
        if network.network_token.symbol.is_empty() {
            return Err(RpcError::invalid_params("Network Token Symbol is required"));
        }
        if network.network_token.name.is_empty() {
            return Err(RpcError::invalid_params("Network Token Name is required"));
        }

        if self.trusted.is_trusted(ctx) {
            info!(
                chain_id = chain_id,
                domain = ctx.domain().unwrap_or("-"),
                "Trusted origin, applying chain without approval"
            );
            self.apply(&chains, &network).await?;
            return Ok(HandlerOutcome::Result(Value::Null));
        }

        if chains.contains_key(&chain_id) {
            let action_id = self
                .actions
                .add_action(ctx, json!({ "network": network }), VIEW_SWITCH)
                .await?;
            return Ok(HandlerOutcome::Deferred(action_id));
        }

        if !self
            .networks
            .is_valid_rpc_url(chain_id, rpc_url, network.custom_rpc_headers.as_ref())
            .await
        {
            return Err(RpcError::invalid_params("ChainID does not match the rpc url"));
        }

        let display_data = json!({
            "network": network,
            "options": { "requiresGlacierApiKey": requested.requires_glacier_api_key() },
        });
        let action_id = self.actions.add_action(ctx, display_data, VIEW_ADD).await?;
        Ok(HandlerOutcome::Deferred(action_id))
    }
}

#[async_trait]
impl RequestHandler for AddEthereumChainHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["wallet_addEthereumChain"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        self.handle(ctx).await
    }

    async fn handle_unauthenticated(&self, ctx: &RequestContext) -> HandlerResult {
        self.handle(ctx).await
    }

    async fn on_action_approved(
        &self,
        action: Action,
        _result: Option<Value>,
        resolver: ActionResolver,
    ) {
        let outcome = async {
            let chains = self.networks.all_networks().await?;
            let DisplayedNetwork { network } = serde_json::from_value(action.display_data)
                .map_err(|e| RpcError::internal(e.to_string()))?;
            self.apply(&chains, &network).await?;
            info!(chain_id = network.chain_id, "Network request approved");
            Ok::<_, RpcError>(Value::Null)
        }
        .await;
        resolver.resolve(outcome);
    }
}
