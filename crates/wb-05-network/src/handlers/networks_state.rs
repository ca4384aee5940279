use crate::service::NetworkService;
use async_trait::async_trait;
use serde_json::json;
use shared_types::Network;
use std::sync::Arc;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `networks_getNetworksState`: everything the network switcher renders.
pub struct GetNetworksStateHandler {
    networks: Arc<NetworkService>,
}

impl GetNetworksStateHandler {
    pub fn new(networks: Arc<NetworkService>) -> Self {
        Self { networks }
    }
}

#[async_trait]
impl RequestHandler for GetNetworksStateHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["networks_getNetworksState"]
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let mut networks: Vec<Network> = self.networks.all_networks().await?.into_values().collect();
        networks.sort_by(|a, b| a.chain_name.cmp(&b.chain_name));
        let active = self.networks.active_network().await?;
        let custom: Vec<u64> = self.networks.custom_networks().await?.into_keys().collect();

        Ok(HandlerOutcome::Result(json!({
            "networks": networks,
            "network": active,
            "isDeveloperMode": active.as_ref().is_some_and(|n| n.is_testnet),
            "customNetworks": custom,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::{network, service, FUJI};
    use shared_types::{ConnectionId, Request};
    use wb_01_transport::ConnectionKind;

    #[tokio::test]
    async fn test_state_lists_sorted_networks() {
        let networks = Arc::new(service());
        networks
            .save_custom_network(network(1, "Ethereum", false))
            .await
            .unwrap();
        networks.set_network(FUJI).await.unwrap();

        let handler = GetNetworksStateHandler::new(networks);
        let ctx = RequestContext::new(
            Request::new(1, "networks_getNetworksState"),
            ConnectionId(1),
            ConnectionKind::Extension,
        );
        let HandlerOutcome::Result(state) = handler.handle_authenticated(&ctx).await.unwrap() else {
            panic!("expected an immediate result");
        };

        let names: Vec<&str> = state["networks"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["chainName"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Avalanche C-Chain", "Avalanche Fuji", "Ethereum"]);
        assert_eq!(state["network"]["chainId"], FUJI);
        assert_eq!(state["isDeveloperMode"], true);
        assert_eq!(state["customNetworks"], json!([1]));
    }
}
