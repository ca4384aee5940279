use crate::ports::ActiveAccountProvider;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use wb_02_dispatch::{HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `eth_accounts`: the active address for connected sites, nothing otherwise.
pub struct AccountsHandler {
    accounts: Arc<dyn ActiveAccountProvider>,
}

impl AccountsHandler {
    pub fn new(accounts: Arc<dyn ActiveAccountProvider>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl RequestHandler for AccountsHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["eth_accounts"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let accounts: Vec<String> = self.accounts.active_address().await.into_iter().collect();
        Ok(HandlerOutcome::Result(json!(accounts)))
    }

    async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        Ok(HandlerOutcome::Result(json!([])))
    }
}
