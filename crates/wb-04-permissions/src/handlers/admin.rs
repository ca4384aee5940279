//! Connected-sites page.

use crate::service::PermissionsService;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::sync::Arc;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

pub struct GetAllPermissionsHandler {
    permissions: Arc<PermissionsService>,
}

impl GetAllPermissionsHandler {
    pub fn new(permissions: Arc<PermissionsService>) -> Self {
        Self { permissions }
    }
}

#[async_trait]
impl RequestHandler for GetAllPermissionsHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["permissions_getAllPermissions"]
    }

    async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        let permissions = self.permissions.get_permissions().await?;
        let value =
            serde_json::to_value(permissions).map_err(|e| RpcError::internal(e.to_string()))?;
        Ok(HandlerOutcome::Result(value))
    }
}

/// params `[domain]`
pub struct RevokeDomainAccessHandler {
    permissions: Arc<PermissionsService>,
}

impl RevokeDomainAccessHandler {
    pub fn new(permissions: Arc<PermissionsService>) -> Self {
        Self { permissions }
    }
}

#[async_trait]
impl RequestHandler for RevokeDomainAccessHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["permissions_revokeDomainAccess"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let domain = ctx
            .param(0)
            .and_then(Value::as_str)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| RpcError::invalid_params("Missing domain"))?;
        self.permissions.revoke_domain(domain).await?;
        Ok(HandlerOutcome::Result(Value::Null))
    }
}
