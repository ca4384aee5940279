use shared_types::{ConnectionId, RequestId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unknown connection name: {0}")]
    UnknownConnectionName(String),

    #[error("request id {0} is already in flight")]
    DuplicateRequestId(RequestId),

    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("failed to encode frame: {0}")]
    Encode(String),
}
