//! Method dispatch for one trust domain.

use crate::handler::{HandlerMode, HandlerOutcome, RequestContext};
use crate::registry::HandlerRegistry;
use futures::FutureExt;
use shared_types::{Response, RpcError};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error};

/// Outcome of the permission gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// Extension-origin; always served by `handle_authenticated`.
    Trusted,
    /// dApp domain connected to the active account.
    Authenticated,
    /// dApp domain without a grant.
    Unauthenticated,
}

pub struct DispatchEngine {
    label: &'static str,
    registry: HandlerRegistry,
}

impl DispatchEngine {
    pub fn new(label: &'static str, registry: HandlerRegistry) -> Self {
        Self { label, registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Run the single handler registered for the request's method.
    pub async fn dispatch(&self, ctx: RequestContext, auth: Authentication) -> Response {
        let Some(handler) = self.registry.get(ctx.method()) else {
            debug!(domain = self.label, method = ctx.method(), "Method not found");
            let error = RpcError::method_not_found(ctx.method());
            return Response::error(ctx.request, error);
        };

        debug!(
            domain = self.label,
            method = ctx.method(),
            request_id = %ctx.request.id,
            auth = ?auth,
            "Dispatching request"
        );

        let call = async {
            match auth {
                Authentication::Trusted | Authentication::Authenticated => {
                    handler.handle_authenticated(&ctx).await
                }
                Authentication::Unauthenticated => match handler.mode() {
                    HandlerMode::DualMode => handler.handle_unauthenticated(&ctx).await,
                    HandlerMode::AuthenticatedOnly => Err(RpcError::unauthorized()),
                },
            }
        };

        let outcome = AssertUnwindSafe(call).catch_unwind().await;
        let request = ctx.request;
        match outcome {
            Ok(Ok(HandlerOutcome::Result(value))) => Response::result(request, value),
            Ok(Ok(HandlerOutcome::Deferred(action_id))) => Response::deferred(request, action_id),
            Ok(Err(rpc_error)) => {
                debug!(method = %request.method, error = %rpc_error, "Handler returned error");
                Response::error(request, rpc_error)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(method = %request.method, panic = %message, "Handler panicked");
                Response::error(request, RpcError::internal(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
