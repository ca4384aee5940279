//! The adapter loop that drives one connection.

use crate::connection::Connection;
use crate::ports::inbound::MessageHandler;
use crate::registry::ConnectionRegistry;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{Request, Response, RpcError};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Default maximum inbound frame size (1MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Largest accepted inbound frame in bytes.
    pub max_message_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Run a connection until its inbound stream ends.
///
/// Every accepted request runs in its own task. When the stream ends the
/// connection is removed from the registry and its outstanding tasks are
/// aborted.
pub async fn serve_connection<S>(
    registry: Arc<ConnectionRegistry>,
    connection: Arc<Connection>,
    mut inbound: S,
    handler: Arc<dyn MessageHandler>,
    config: TransportConfig,
) where
    S: Stream<Item = String> + Send + Unpin,
{
    info!(connection_id = %connection.id(), name = connection.name(), "Serving connection");
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            frame = inbound.next() => {
                let Some(frame) = frame else { break };
                let Some(request) = accept_frame(&connection, &frame, &config) else {
                    continue;
                };
                debug!(
                    connection_id = %connection.id(),
                    request_id = %request.id,
                    method = %request.method,
                    "Request accepted"
                );
                let conn = connection.clone();
                let handler = handler.clone();
                tasks.spawn(async move {
                    let response = handler.on_message(conn.clone(), request).await;
                    conn.reply(response);
                });
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        error!(connection_id = %connection.id(), "Request task panicked");
                    }
                }
            }
        }
    }

    registry.disconnect(connection.id());
    let aborted = tasks.len();
    tasks.shutdown().await;
    info!(
        connection_id = %connection.id(),
        aborted_tasks = aborted,
        "Connection finished"
    );
}

/// Parse and register a frame; answers malformed frames directly.
fn accept_frame(connection: &Connection, frame: &str, config: &TransportConfig) -> Option<Request> {
    if frame.len() > config.max_message_size {
        warn!(
            connection_id = %connection.id(),
            size = frame.len(),
            max = config.max_message_size,
            "Message exceeds size limit"
        );
        connection.reject_frame(RpcError::invalid_request(format!(
            "Message too large: {} bytes (max: {})",
            frame.len(),
            config.max_message_size
        )));
        return None;
    }

    let value: Value = match serde_json::from_str(frame) {
        Ok(value) => value,
        Err(e) => {
            warn!(connection_id = %connection.id(), error = %e, "Unparseable frame");
            connection.reject_frame(RpcError::parse_error(e.to_string()));
            return None;
        }
    };

    let request: Request = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            warn!(connection_id = %connection.id(), error = %e, "Frame is not a request");
            connection.reject_frame(RpcError::invalid_request(e.to_string()));
            return None;
        }
    };

    if let Err(e) = connection.begin(&request.id) {
        warn!(connection_id = %connection.id(), error = %e, "Rejecting duplicate request id");
        connection.send_untracked(Response::error(
            request,
            RpcError::invalid_request(e.to_string()),
        ));
        return None;
    }

    Some(request)
}
