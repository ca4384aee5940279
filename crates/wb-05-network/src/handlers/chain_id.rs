use crate::service::NetworkService;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::sync::Arc;
use wb_02_dispatch::{HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `eth_chainId`: hex id of the active network, for every caller.
pub struct ChainIdHandler {
    networks: Arc<NetworkService>,
}

impl ChainIdHandler {
    pub fn new(networks: Arc<NetworkService>) -> Self {
        Self { networks }
    }

    async fn chain_id(&self) -> HandlerResult {
        let network = self
            .networks
            .active_network()
            .await?
            .ok_or_else(|| RpcError::invalid_request("no active network found"))?;
        Ok(HandlerOutcome::Result(Value::String(network.chain_id_hex())))
    }
}

#[async_trait]
impl RequestHandler for ChainIdHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["eth_chainId"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        self.chain_id().await
    }

    async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        self.chain_id().await
    }
}
