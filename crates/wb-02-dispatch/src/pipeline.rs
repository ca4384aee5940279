//! Domain classification and permission gate in front of the engines.

use crate::engine::{Authentication, DispatchEngine};
use crate::handler::{RequestContext, RequestHandler};
use crate::ports::PermissionGate;
use crate::registry::HandlerRegistry;
use async_trait::async_trait;
use shared_types::{Request, Response, Site};
use std::sync::Arc;
use tracing::debug;
use wb_01_transport::{Connection, ConnectionKind, MessageHandler};

pub struct Pipeline {
    extension: DispatchEngine,
    dapp: DispatchEngine,
    gate: Arc<dyn PermissionGate>,
}

impl Pipeline {
    pub fn new(
        extension: HandlerRegistry,
        dapp: HandlerRegistry,
        gate: Arc<dyn PermissionGate>,
    ) -> Self {
        Self {
            extension: DispatchEngine::new("extension", extension),
            dapp: DispatchEngine::new("dapp", dapp),
            gate,
        }
    }

    /// Handler owning `method`, looked up across both domains.
    pub fn handler_for(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        self.dapp
            .registry()
            .get(method)
            .or_else(|| self.extension.registry().get(method))
    }

    /// Route a request that arrived on `connection`.
    pub async fn route(&self, connection: &Connection, request: Request) -> Response {
        match connection.kind() {
            ConnectionKind::Extension => {
                let ctx = RequestContext::new(request, connection.id(), ConnectionKind::Extension);
                self.extension.dispatch(ctx, Authentication::Trusted).await
            }
            ConnectionKind::DApp => {
                let request = stamp_site(request, connection);
                let auth = match request.domain() {
                    Some(domain) if self.gate.is_domain_connected(domain).await => {
                        Authentication::Authenticated
                    }
                    _ => Authentication::Unauthenticated,
                };
                debug!(
                    connection_id = %connection.id(),
                    domain = request.domain().unwrap_or("-"),
                    auth = ?auth,
                    "Permission gate evaluated"
                );
                let ctx = RequestContext::new(request, connection.id(), ConnectionKind::DApp);
                self.dapp.dispatch(ctx, auth).await
            }
        }
    }
}

/// Replace whatever site the page claimed with what the connection knows.
fn stamp_site(mut request: Request, connection: &Connection) -> Request {
    let claimed = request.site.take();
    request.site = connection.domain().map(|domain| Site {
        tab_id: connection.sender().tab_id,
        domain: domain.to_string(),
        name: claimed.as_ref().and_then(|s| s.name.clone()),
        icon: claimed.and_then(|s| s.icon),
    });
    request
}

#[async_trait]
impl MessageHandler for Pipeline {
    async fn on_message(&self, connection: Arc<Connection>, request: Request) -> Response {
        self.route(&connection, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerMode, HandlerOutcome, HandlerResult};
    use serde_json::{json, Value};
    use shared_types::ResponseBody;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use wb_01_transport::{ConnectionRegistry, SenderInfo};

    /// Gate backed by a plain set of connected domains.
    #[derive(Default)]
    struct Granted(Mutex<HashSet<String>>);

    #[async_trait]
    impl PermissionGate for Granted {
        async fn is_domain_connected(&self, domain: &str) -> bool {
            self.0.lock().unwrap().contains(domain)
        }
    }

    struct Accounts;

    #[async_trait]
    impl RequestHandler for Accounts {
        fn methods(&self) -> &'static [&'static str] {
            &["eth_accounts"]
        }

        fn mode(&self) -> HandlerMode {
            HandlerMode::DualMode
        }

        async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
            Ok(HandlerOutcome::Result(json!({
                "accounts": ["0xabc"],
                "domain": ctx.domain(),
            })))
        }

        async fn handle_unauthenticated(&self, _ctx: &RequestContext) -> HandlerResult {
            Ok(HandlerOutcome::Result(json!({ "accounts": [] })))
        }
    }

    struct Internal;

    #[async_trait]
    impl RequestHandler for Internal {
        fn methods(&self) -> &'static [&'static str] {
            &["account_select"]
        }

        async fn handle_authenticated(&self, _ctx: &RequestContext) -> HandlerResult {
            Ok(HandlerOutcome::Result(json!("success")))
        }
    }

    fn pipeline(gate: Arc<Granted>) -> Pipeline {
        let dapp = HandlerRegistry::builder()
            .register(Arc::new(Accounts))
            .unwrap()
            .build();
        let extension = HandlerRegistry::builder()
            .register(Arc::new(Internal))
            .unwrap()
            .build();
        Pipeline::new(extension, dapp, gate)
    }

    fn result(response: Response) -> Value {
        match response.body {
            ResponseBody::Final(Ok(value)) => value,
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_gate_switches_paths_after_grant() {
        let gate = Arc::new(Granted::default());
        let pipeline = pipeline(gate.clone());
        let registry = ConnectionRegistry::default();
        let (dapp, _rx) = registry
            .register(
                "provider",
                SenderInfo::new(Some(2), Some("https://app.example/page".into())),
            )
            .unwrap();

        let before = pipeline.route(&dapp, Request::new(1, "eth_accounts")).await;
        assert_eq!(result(before)["accounts"], json!([]));

        gate.0.lock().unwrap().insert("app.example".into());
        let after = pipeline.route(&dapp, Request::new(2, "eth_accounts")).await;
        let value = result(after);
        assert_eq!(value["accounts"], json!(["0xabc"]));
        assert_eq!(value["domain"], json!("app.example"));
    }

    #[tokio::test]
    async fn test_page_cannot_spoof_site() {
        let gate = Arc::new(Granted::default());
        gate.0.lock().unwrap().insert("bank.example".into());
        let pipeline = pipeline(gate);
        let registry = ConnectionRegistry::default();
        let (dapp, _rx) = registry
            .register("provider", SenderInfo::new(Some(2), Some("https://evil.example".into())))
            .unwrap();

        let spoofed = Request::new(1, "eth_accounts").with_site(Site {
            domain: "bank.example".into(),
            name: Some("Bank".into()),
            ..Default::default()
        });
        let response = pipeline.route(&dapp, spoofed).await;
        assert_eq!(response.request.domain(), Some("evil.example"));
        assert_eq!(response.request.site.as_ref().unwrap().name.as_deref(), Some("Bank"));
        assert_eq!(result(response)["accounts"], json!([]));
    }

    #[tokio::test]
    async fn test_domains_are_separate() {
        let pipeline = pipeline(Arc::new(Granted::default()));
        let registry = ConnectionRegistry::default();
        let (ext, _rx1) = registry.register("extension", SenderInfo::default()).unwrap();
        let (dapp, _rx2) = registry
            .register("provider", SenderInfo::new(None, Some("https://app.example".into())))
            .unwrap();

        let from_extension = pipeline.route(&ext, Request::new(1, "account_select")).await;
        assert_eq!(result(from_extension), json!("success"));

        let from_dapp = pipeline.route(&dapp, Request::new(1, "account_select")).await;
        let wire = from_dapp.to_value().unwrap();
        assert_eq!(wire["error"]["code"], -32601);

        assert!(pipeline.handler_for("account_select").is_some());
        assert!(pipeline.handler_for("eth_accounts").is_some());
    }
}
