//! Message signing with user approval.

use crate::domain::message::{MessageParams, MessageType};
use crate::domain::typed_data::{ensure_message_format_is_valid, validate_typed_data};
use crate::error::WalletError;
use crate::ports::WalletService;
use async_trait::async_trait;
use serde_json::{json, Value};
use shared_types::{Action, RpcError};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wb_02_dispatch::{
    ActionResolver, HandlerMode, HandlerOutcome, HandlerResult, RequestContext, RequestHandler,
};
use wb_03_actions::ActionService;
use wb_05_network::NetworkService;

pub const VIEW_SIGN: &str = "sign";

pub struct SignMessageHandler {
    wallet: Arc<dyn WalletService>,
    networks: Arc<NetworkService>,
    actions: Arc<ActionService>,
}

impl SignMessageHandler {
    pub fn new(
        wallet: Arc<dyn WalletService>,
        networks: Arc<NetworkService>,
        actions: Arc<ActionService>,
    ) -> Self {
        Self {
            wallet,
            networks,
            actions,
        }
    }
}

#[async_trait]
impl RequestHandler for SignMessageHandler {
    fn methods(&self) -> &'static [&'static str] {
        MessageType::METHODS
    }

    fn mode(&self) -> HandlerMode {
        HandlerMode::DualMode
    }

    async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        Err(RpcError::message("account not available"))
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        if self.wallet.wallet_type().await.is_none() {
            return Err(WalletError::Undefined.into());
        }
        let network = self
            .networks
            .active_network()
            .await?
            .ok_or_else(|| RpcError::invalid_request("no active network found"))?;
        let kind = MessageType::from_method(ctx.method())
            .ok_or_else(|| RpcError::method_not_found(ctx.method()))?;

        let params = MessageParams::from_params(kind, ctx.request.params.as_ref())?;
        ensure_message_format_is_valid(kind, &params.data, network.chain_id)?;

        // Sites often send slightly malformed EIP-712 data; show it flagged
        // instead of refusing.
        let validation = if kind.is_structured() {
            validate_typed_data(&params.data)
        } else {
            Ok(())
        };
        if let Err(reason) = &validation {
            debug!(method = %kind, reason = %reason, "Typed data failed validation");
        }

        let display_data = json!({
            "messageParams": params,
            "isMessageValid": validation.is_ok(),
            "validationError": validation.err(),
        });
        let action_id = self.actions.add_action(ctx, display_data, VIEW_SIGN).await?;
        Ok(HandlerOutcome::Deferred(action_id))
    }

    async fn on_action_approved(
        &self,
        action: Action,
        _result: Option<Value>,
        resolver: ActionResolver,
    ) {
        let Some(kind) = MessageType::from_method(action.method()) else {
            resolver.error(RpcError::method_not_found(action.method()));
            return;
        };
        match self.wallet.sign_message(kind, &action).await {
            Ok(signature) => {
                info!(action_id = %action.action_id, method = %kind, "Message signed");
                resolver.success(Value::String(signature));
            }
            Err(e) => {
                warn!(action_id = %action.action_id, error = %e, "Signing failed");
                resolver.error(e.into());
            }
        }
    }
}
