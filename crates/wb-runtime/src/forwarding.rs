//! Bus events pushed to live connections.
//!
//! ```text
//! WalletEvent ──▶ every extension connection   { name, value }
//!             └─▶ connected dApp connections   accountsChanged | chainChanged
//! ```

use serde_json::json;
use shared_bus::{Subscription, WalletEvent};
use std::sync::Arc;
use tracing::{debug, info};
use wb_01_transport::{ConnectionEvent, ConnectionKind, ConnectionRegistry};
use wb_02_dispatch::PermissionGate;

pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
pub const CHAIN_CHANGED: &str = "chainChanged";

pub struct EventForwarder {
    registry: Arc<ConnectionRegistry>,
    gate: Arc<dyn PermissionGate>,
}

impl EventForwarder {
    pub fn new(registry: Arc<ConnectionRegistry>, gate: Arc<dyn PermissionGate>) -> Self {
        Self { registry, gate }
    }

    /// Forward until the bus closes.
    pub async fn run(self, mut subscription: Subscription) {
        info!("Event forwarding started");
        while let Some(event) = subscription.recv().await {
            self.forward(&event).await;
        }
        info!("Event bus closed, forwarding stopped");
    }

    /// Push one event. Returns how many connections took it.
    pub async fn forward(&self, event: &WalletEvent) -> usize {
        let extension = self.registry.broadcast(
            ConnectionKind::Extension,
            &ConnectionEvent::new(event.name(), event.value()),
        );
        let dapps = match dapp_event(event) {
            Some(dapp_event) => self.to_connected_dapps(&dapp_event).await,
            None => 0,
        };
        debug!(event = event.name(), extension = extension, dapps = dapps, "Event forwarded");
        extension + dapps
    }

    async fn to_connected_dapps(&self, event: &ConnectionEvent) -> usize {
        let mut delivered = 0;
        for connection in self.registry.connections(ConnectionKind::DApp) {
            let Some(domain) = connection.domain() else {
                continue;
            };
            if self.gate.is_domain_connected(domain).await && connection.emit(event.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}

/// The provider-facing form of a bus event, if dApps see it at all.
fn dapp_event(event: &WalletEvent) -> Option<ConnectionEvent> {
    match event {
        WalletEvent::AccountsUpdated {
            active: Some(active),
            ..
        } => Some(ConnectionEvent::new(ACCOUNTS_CHANGED, json!([active.address_c]))),
        WalletEvent::NetworkChanged(network) => Some(ConnectionEvent::new(
            CHAIN_CHANGED,
            json!({
                "chainId": network.chain_id_hex(),
                "networkVersion": network.chain_id.to_string(),
            }),
        )),
        _ => None,
    }
}
