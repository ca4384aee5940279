use crate::service::{PermissionsService, SiteMetadata};
use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::sync::Arc;
use tracing::debug;
use wb_02_dispatch::{HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `metamask_sendDomainMetadata`: remembers the name and icon a page announces.
pub struct SendDomainMetadataHandler {
    permissions: Arc<PermissionsService>,
}

impl SendDomainMetadataHandler {
    pub fn new(permissions: Arc<PermissionsService>) -> Self {
        Self { permissions }
    }

    fn store(&self, ctx: &RequestContext) -> HandlerResult {
        let domain = ctx
            .domain()
            .ok_or_else(|| RpcError::invalid_request("domain unknown"))?;
        let metadata: SiteMetadata = match ctx.request.params.clone() {
            Some(Value::Array(mut items)) if !items.is_empty() => {
                serde_json::from_value(items.swap_remove(0))
            }
            Some(other) => serde_json::from_value(other),
            None => Ok(SiteMetadata::default()),
        }
        .map_err(|e| RpcError::invalid_params(e.to_string()))?;

        debug!(domain = domain, name = ?metadata.name, "Site metadata received");
        self.permissions.set_site_metadata(domain, metadata);
        Ok(HandlerOutcome::Result(Value::Bool(true)))
    }
}

#[async_trait]
impl RequestHandler for SendDomainMetadataHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["metamask_sendDomainMetadata"]
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        self.store(ctx)
    }

    async fn handle_unauthenticated(&self, ctx: &RequestContext) -> HandlerResult {
        self.store(ctx)
    }
}
