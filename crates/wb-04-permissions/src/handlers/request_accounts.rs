//! `eth_requestAccounts`: the connect flow.

use crate::ports::ActiveAccountProvider;
use crate::service::PermissionsService;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{Action, RpcError};
use std::sync::Arc;
use tracing::info;
use wb_02_dispatch::{
    ActionResolver, HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler,
};
use wb_03_actions::ActionService;

pub struct RequestAccountsHandler {
    permissions: Arc<PermissionsService>,
    accounts: Arc<dyn ActiveAccountProvider>,
    actions: Arc<ActionService>,
}

impl RequestAccountsHandler {
    pub fn new(
        permissions: Arc<PermissionsService>,
        accounts: Arc<dyn ActiveAccountProvider>,
        actions: Arc<ActionService>,
    ) -> Self {
        Self {
            permissions,
            accounts,
            actions,
        }
    }
}

#[async_trait]
impl RequestHandler for RequestAccountsHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["eth_requestAccounts"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let address = self
            .accounts
            .active_address()
            .await
            .ok_or_else(|| RpcError::message("account not available"))?;
        Ok(HandlerOutcome::Result(json!([address])))
    }

    async fn handle_unauthenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let domain = ctx
            .domain()
            .ok_or_else(|| RpcError::invalid_request("domain unknown"))?;
        let address = self
            .accounts
            .active_address()
            .await
            .ok_or_else(|| RpcError::message("account not available"))?;

        let metadata = self.permissions.site_metadata(domain).unwrap_or_default();
        let display_data = json!({
            "domainUrl": domain,
            "domainName": metadata.name.as_deref().unwrap_or(domain),
            "domainIcon": metadata.icon,
            "accountAddress": address,
        });
        let action_id = self
            .actions
            .add_action(ctx, display_data, "permissions")
            .await?;
        Ok(HandlerOutcome::Deferred(action_id))
    }

    async fn on_action_approved(
        &self,
        action: Action,
        result: Option<Value>,
        resolver: ActionResolver,
    ) {
        let Some(domain) = action.request.domain().map(str::to_string) else {
            resolver.error(RpcError::invalid_request("domain unknown"));
            return;
        };
        // The surface may pick an account; otherwise the active one is granted.
        let picked = result.as_ref().and_then(Value::as_str).map(str::to_string);
        let address = match picked {
            Some(address) => address,
            None => match self.accounts.active_address().await {
                Some(address) => address,
                None => {
                    resolver.error(RpcError::message("account not available"));
                    return;
                }
            },
        };

        match self.permissions.grant(&domain, &address).await {
            Ok(()) => {
                info!(domain = %domain, "Connect request approved");
                resolver.success(json!([address]));
            }
            Err(e) => resolver.error(e.into()),
        }
    }
}
