use crate::service::NetworkService;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use wb_02_dispatch::{HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler};
use wb_04_permissions::ActiveAccountProvider;

/// `metamask_getProviderState`: bootstrap data for the injected provider.
pub struct GetProviderStateHandler {
    networks: Arc<NetworkService>,
    accounts: Arc<dyn ActiveAccountProvider>,
}

impl GetProviderStateHandler {
    pub fn new(networks: Arc<NetworkService>, accounts: Arc<dyn ActiveAccountProvider>) -> Self {
        Self { networks, accounts }
    }

    async fn state(&self, accounts: Vec<String>) -> HandlerResult {
        let network = self.networks.active_network().await?;
        Ok(HandlerOutcome::Result(json!({
            "isUnlocked": true,
            "chainId": network.as_ref().map(|n| n.chain_id_hex()),
            "networkVersion": network.as_ref().map_or(Value::Null, |n| json!(n.chain_id.to_string())),
            "accounts": accounts,
        })))
    }
}

#[async_trait]
impl RequestHandler for GetProviderStateHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["metamask_getProviderState"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let accounts = self.accounts.active_address().await.into_iter().collect();
        self.state(accounts).await
    }

    async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        self.state(Vec::new()).await
    }
}
