//! Handle to one physical connection.

use crate::domain::inflight::{DropReason, InFlightTable};
use crate::domain::message::{ConnectionEvent, ConnectionKind, OutboundMessage, SenderInfo};
use crate::error::TransportError;
use parking_lot::Mutex;
use shared_types::{ConnectionId, RequestId, Response, RpcError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// A registered connection.
///
/// Writes go through an unbounded channel drained by the host adapter, so
/// every method here is synchronous and never holds a lock across an await.
pub struct Connection {
    id: ConnectionId,
    name: String,
    kind: ConnectionKind,
    sender: SenderInfo,
    domain: Option<String>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    in_flight: Mutex<InFlightTable>,
    closed: AtomicBool,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        name: String,
        kind: ConnectionKind,
        sender: SenderInfo,
        outbound: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        let domain = sender.domain();
        Self {
            id,
            name,
            kind,
            sender,
            domain,
            outbound,
            in_flight: Mutex::new(InFlightTable::default()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn sender(&self) -> &SenderInfo {
        &self.sender
    }

    /// Host name of the page behind this connection.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Start tracking an inbound request id.
    pub fn begin(&self, id: &RequestId) -> Result<(), TransportError> {
        if self.in_flight.lock().begin(id) {
            Ok(())
        } else {
            Err(TransportError::DuplicateRequestId(id.clone()))
        }
    }

    /// Write the request task's answer for a tracked id.
    pub fn reply(&self, response: Response) {
        let id = response.id().clone();
        let outcome = self.in_flight.lock().reply(response);
        self.flush(&id, outcome);
    }

    /// Write a terminal answer produced after the request task finished.
    ///
    /// Returns `false` if the answer was discarded.
    pub fn deliver(&self, response: Response) -> bool {
        let id = response.id().clone();
        let outcome = self.in_flight.lock().deliver(response);
        self.flush(&id, outcome)
    }

    /// Write a response for an id that is not tracked (e.g. a rejected duplicate).
    pub fn send_untracked(&self, response: Response) -> bool {
        self.push(OutboundMessage::Response(response))
    }

    /// Answer a frame that never became a request.
    pub fn reject_frame(&self, error: RpcError) -> bool {
        self.push(OutboundMessage::FrameError(error))
    }

    pub fn emit(&self, event: ConnectionEvent) -> bool {
        self.push(OutboundMessage::Event(event))
    }

    /// Stop accepting writes. Outstanding ids are forgotten.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let dropped = {
                let mut table = self.in_flight.lock();
                let dropped = table.len();
                table.clear();
                dropped
            };
            debug!(connection_id = %self.id, dropped = dropped, "Connection closed");
        }
    }

    fn flush(&self, id: &RequestId, outcome: Result<Vec<Response>, DropReason>) -> bool {
        match outcome {
            Ok(frames) => {
                let mut written = true;
                for frame in frames {
                    written &= self.push(OutboundMessage::Response(frame));
                }
                written
            }
            Err(reason) => {
                warn!(
                    connection_id = %self.id,
                    request_id = %id,
                    reason = ?reason,
                    "Response dropped"
                );
                false
            }
        }
    }

    fn push(&self, message: OutboundMessage) -> bool {
        if self.is_closed() {
            debug!(connection_id = %self.id, "Discarding write to closed connection");
            return false;
        }
        self.outbound.send(message).is_ok()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("domain", &self.domain)
            .finish()
    }
}
