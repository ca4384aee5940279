//! Channel-backed connection for tests and embedders.

use crate::connection::Connection;
use crate::domain::message::{ConnectionEvent, OutboundMessage, SenderInfo};
use crate::error::TransportError;
use crate::ports::inbound::MessageHandler;
use crate::registry::ConnectionRegistry;
use crate::service::{serve_connection, TransportConfig};
use serde_json::Value;
use shared_types::Request;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Client end of an in-process connection.
///
/// Dropping the port (or calling [`close`](Self::close)) ends the inbound
/// stream, which disconnects the connection.
pub struct InMemoryPort {
    connection: Arc<Connection>,
    inbound: mpsc::UnboundedSender<String>,
    outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    task: JoinHandle<()>,
}

impl InMemoryPort {
    /// Register a connection named `name` and start serving it.
    pub fn connect(
        registry: Arc<ConnectionRegistry>,
        name: &str,
        sender: SenderInfo,
        handler: Arc<dyn MessageHandler>,
        config: TransportConfig,
    ) -> Result<Self, TransportError> {
        let (connection, outbound) = registry.register(name, sender)?;
        let (inbound, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(serve_connection(
            registry,
            connection.clone(),
            UnboundedReceiverStream::new(rx),
            handler,
            config,
        ));
        Ok(Self {
            connection,
            inbound,
            outbound,
            task,
        })
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    pub fn send(&self, request: &Request) -> Result<(), TransportError> {
        let frame =
            serde_json::to_string(request).map_err(|e| TransportError::Encode(e.to_string()))?;
        self.send_raw(frame)
    }

    pub fn send_raw(&self, frame: impl Into<String>) -> Result<(), TransportError> {
        self.inbound
            .send(frame.into())
            .map_err(|_| TransportError::Closed(self.connection.id()))
    }

    /// Next frame written to this connection.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.outbound.recv().await
    }

    /// Next response frame as wire JSON, skipping pushed events.
    pub async fn next_response(&mut self) -> Option<Value> {
        loop {
            match self.outbound.recv().await? {
                OutboundMessage::Event(_) => continue,
                frame => return Some(frame.to_value()),
            }
        }
    }

    /// Next pushed event, skipping responses.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        loop {
            if let OutboundMessage::Event(event) = self.outbound.recv().await? {
                return Some(event);
            }
        }
    }

    /// Frame already queued, without waiting.
    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.outbound.try_recv().ok()
    }

    /// End the inbound stream and wait for the serve loop to finish.
    pub async fn close(self) {
        let InMemoryPort { inbound, task, .. } = self;
        drop(inbound);
        let _ = task.await;
    }
}
