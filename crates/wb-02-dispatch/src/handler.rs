//! The handler contract.

use async_trait::async_trait;
use serde_json::Value;
use shared_types::{Action, ActionId, ConnectionId, Request, RpcError};
use tokio::sync::oneshot;
use tracing::debug;
use wb_01_transport::ConnectionKind;

/// Which pipeline paths a handler serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerMode {
    /// Only callers that passed the permission gate.
    AuthenticatedOnly,
    /// Unconnected callers are served by `handle_unauthenticated`.
    DualMode,
}

/// Successful handler outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// Answer immediately.
    Result(Value),
    /// Consent pending; the terminal answer follows once the action resolves.
    Deferred(ActionId),
}

pub type HandlerResult = Result<HandlerOutcome, RpcError>;

/// Final value of an approved or rejected action.
pub type ActionOutcome = Result<Value, RpcError>;

/// Everything a handler learns about a request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request: Request,
    pub connection_id: ConnectionId,
    pub kind: ConnectionKind,
}

impl RequestContext {
    pub fn new(request: Request, connection_id: ConnectionId, kind: ConnectionKind) -> Self {
        Self {
            request,
            connection_id,
            kind,
        }
    }

    pub fn method(&self) -> &str {
        &self.request.method
    }

    pub fn param(&self, index: usize) -> Option<&Value> {
        self.request.param(index)
    }

    /// Calling site's domain (dApp requests only).
    pub fn domain(&self) -> Option<&str> {
        self.request.domain()
    }

    pub fn tab_id(&self) -> Option<u32> {
        self.request.site.as_ref().and_then(|site| site.tab_id)
    }
}

/// Consume-once handle that settles an action.
///
/// Dropping it unused settles the action with an internal error.
#[derive(Debug)]
pub struct ActionResolver {
    tx: oneshot::Sender<ActionOutcome>,
}

impl ActionResolver {
    pub fn channel() -> (Self, oneshot::Receiver<ActionOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn success(self, value: Value) {
        self.resolve(Ok(value));
    }

    pub fn error(self, error: RpcError) {
        self.resolve(Err(error));
    }

    pub fn resolve(self, outcome: ActionOutcome) {
        if self.tx.send(outcome).is_err() {
            debug!("Action outcome discarded, nobody is waiting");
        }
    }
}

/// A request handler for one or more methods.
///
/// Handlers are registered once at startup and hold only service references.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Method names served by this handler.
    fn methods(&self) -> &'static [&'static str];

    fn mode(&self) -> HandlerMode {
        HandlerMode::AuthenticatedOnly
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult;

    /// Only reached for [`HandlerMode::DualMode`] handlers.
    async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
        Err(RpcError::unauthorized())
    }

    async fn on_action_approved(
        &self,
        action: Action,
        _result: Option<Value>,
        resolver: ActionResolver,
    ) {
        resolver.error(RpcError::internal(format!(
            "{} does not support approval",
            action.method()
        )));
    }

    async fn on_action_rejected(&self, _action: Action, resolver: ActionResolver) {
        resolver.error(RpcError::user_rejected());
    }
}
