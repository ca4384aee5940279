//! Extension methods used by the approval surface.

use crate::domain::update::ActionUpdate;
use crate::service::ActionService;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::{ActionId, RpcError};
use std::sync::Arc;
use tracing::debug;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `action_getAction`, params `[actionId]`.
pub struct GetActionHandler {
    actions: Arc<ActionService>,
}

impl GetActionHandler {
    pub fn new(actions: Arc<ActionService>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl RequestHandler for GetActionHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["action_getAction"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let id = ctx
            .param(0)
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("missing action id"))?;
        let id = ActionId::parse(id).map_err(|e| RpcError::invalid_params(e.to_string()))?;

        let action = self
            .actions
            .get_action(&id)
            .await?
            .ok_or_else(|| RpcError::message(format!("no action found for id {id}")))?;
        let value = serde_json::to_value(action).map_err(|e| RpcError::internal(e.to_string()))?;
        Ok(HandlerOutcome::Result(value))
    }
}

/// `action_updateStatus`, params `[update]`.
///
/// Answers once the owning handler has settled the action.
pub struct UpdateActionHandler {
    actions: Arc<ActionService>,
}

impl UpdateActionHandler {
    pub fn new(actions: Arc<ActionService>) -> Self {
        Self { actions }
    }
}

#[async_trait]
impl RequestHandler for UpdateActionHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["action_updateStatus"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let update: ActionUpdate = ctx
            .param(0)
            .cloned()
            .ok_or_else(|| RpcError::invalid_params("missing update"))
            .and_then(|raw| {
                serde_json::from_value(raw).map_err(|e| RpcError::invalid_params(e.to_string()))
            })?;
        debug!(action_id = %update.id, status = %update.status, "Action update received");

        self.actions.update_action(update).await?;
        Ok(HandlerOutcome::Result(Value::Bool(true)))
    }
}
