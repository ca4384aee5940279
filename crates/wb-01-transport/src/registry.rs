//! Registry of live connections.

use crate::connection::Connection;
use crate::domain::message::{ConnectionEvent, ConnectionKind, ConnectionNames, OutboundMessage, SenderInfo};
use crate::error::TransportError;
use crate::ports::outbound::ResponseSink;
use dashmap::DashMap;
use shared_types::{ConnectionId, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub struct ConnectionRegistry {
    names: ConnectionNames,
    connections: DashMap<ConnectionId, Arc<Connection>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new(names: ConnectionNames) -> Self {
        Self {
            names,
            connections: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn names(&self) -> &ConnectionNames {
        &self.names
    }

    /// Register a connection by name. The receiver yields every frame to write.
    pub fn register(
        &self,
        name: &str,
        sender: SenderInfo,
    ) -> Result<(Arc<Connection>, mpsc::UnboundedReceiver<OutboundMessage>), TransportError> {
        let kind = self
            .names
            .classify(name)
            .ok_or_else(|| TransportError::UnknownConnectionName(name.to_string()))?;

        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::unbounded_channel();
        let connection = Arc::new(Connection::new(id, name.to_string(), kind, sender, tx));
        self.connections.insert(id, connection.clone());

        info!(
            connection_id = %id,
            name = name,
            kind = ?kind,
            domain = connection.domain().unwrap_or("-"),
            "Connection registered"
        );
        Ok((connection, rx))
    }

    pub fn get(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&id).map(|entry| entry.value().clone())
    }

    /// Remove and close a connection. Later sends to it are discarded.
    pub fn disconnect(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let (_, connection) = self.connections.remove(&id)?;
        connection.close();
        info!(connection_id = %id, name = connection.name(), "Connection removed");
        Some(connection)
    }

    /// Write a frame to a connection by id.
    pub fn send(&self, id: ConnectionId, message: OutboundMessage) -> bool {
        let Some(connection) = self.get(id) else {
            debug!(connection_id = %id, "Send to unknown connection discarded");
            return false;
        };
        match message {
            OutboundMessage::Response(response) => connection.deliver(response),
            OutboundMessage::Event(event) => connection.emit(event),
            OutboundMessage::FrameError(error) => connection.reject_frame(error),
        }
    }

    /// Push an event to every connection of `kind`. Returns how many took it.
    pub fn broadcast(&self, kind: ConnectionKind, event: &ConnectionEvent) -> usize {
        self.connections(kind)
            .into_iter()
            .filter(|connection| connection.emit(event.clone()))
            .count()
    }

    pub fn connections(&self, kind: ConnectionKind) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .filter(|entry| entry.value().kind() == kind)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(ConnectionNames::default())
    }
}

impl ResponseSink for ConnectionRegistry {
    fn deliver(&self, connection_id: ConnectionId, response: Response) -> bool {
        self.send(connection_id, OutboundMessage::Response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_types::{ActionId, Request};

    #[test]
    fn test_register_classifies_by_name() {
        let registry = ConnectionRegistry::default();
        let (ext, _rx1) = registry.register("extension", SenderInfo::default()).unwrap();
        let (dapp, _rx2) = registry
            .register("provider", SenderInfo::new(Some(1), Some("https://a.example".into())))
            .unwrap();
        assert_eq!(ext.kind(), ConnectionKind::Extension);
        assert_eq!(dapp.kind(), ConnectionKind::DApp);
        assert_ne!(ext.id(), dapp.id());
        assert_eq!(registry.len(), 2);

        assert!(matches!(
            registry.register("nope", SenderInfo::default()),
            Err(TransportError::UnknownConnectionName(_))
        ));
    }

    #[test]
    fn test_broadcast_by_kind() {
        let registry = ConnectionRegistry::default();
        let (_ext, mut ext_rx) = registry.register("extension", SenderInfo::default()).unwrap();
        let (_dapp, mut dapp_rx) = registry.register("provider", SenderInfo::default()).unwrap();

        let sent = registry.broadcast(
            ConnectionKind::Extension,
            &ConnectionEvent::new("network_updated", json!({})),
        );
        assert_eq!(sent, 1);
        assert!(ext_rx.try_recv().is_ok());
        assert!(dapp_rx.try_recv().is_err());
    }

    #[test]
    fn test_sink_after_disconnect_is_discarded() {
        let registry = ConnectionRegistry::default();
        let (conn, mut rx) = registry.register("provider", SenderInfo::default()).unwrap();
        let request = Request::new(1, "eth_requestAccounts");
        conn.begin(&request.id).unwrap();
        conn.reply(Response::deferred(request.clone(), ActionId::new()));
        assert!(rx.try_recv().is_ok());

        registry.disconnect(conn.id());
        assert!(registry.is_empty());
        assert!(!registry.deliver(conn.id(), Response::result(request, json!([]))));
        assert!(rx.try_recv().is_err());
    }
}
