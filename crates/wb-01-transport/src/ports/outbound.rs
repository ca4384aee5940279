//! Outbound port: late delivery of terminal responses.

use shared_types::{ConnectionId, Response};

/// Delivers a terminal response to the connection that asked for it.
pub trait ResponseSink: Send + Sync {
    /// Returns `false` if the connection is gone or the id is no longer pending.
    fn deliver(&self, connection_id: ConnectionId, response: Response) -> bool;
}
