//! Per-connection bookkeeping of outstanding request ids.
//!
//! An id enters as `Processing` when its frame is accepted. The request task
//! answers once through [`InFlightTable::reply`]; a deferred answer moves the
//! id to `Deferred`, a terminal one removes it. Terminal answers produced
//! elsewhere (approval resolution) arrive through [`InFlightTable::deliver`];
//! if the id is still `Processing` they are parked and released right after
//! the deferred answer, so the acknowledgement always goes out first.

use shared_types::{RequestId, Response};
use std::collections::HashMap;

#[derive(Debug)]
enum Slot {
    Processing { parked: Option<Response> },
    Deferred,
}

/// Why an answer was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No outstanding request with this id.
    UnknownId,
    /// The request task already answered.
    AlreadyAnswered,
    /// A terminal answer is already parked for this id.
    AlreadyParked,
    /// Only terminal answers may be delivered late.
    NotTerminal,
}

#[derive(Debug, Default)]
pub struct InFlightTable {
    slots: HashMap<RequestId, Slot>,
}

impl InFlightTable {
    /// Start tracking `id`. Returns `false` if it is already outstanding.
    pub fn begin(&mut self, id: &RequestId) -> bool {
        if self.slots.contains_key(id) {
            return false;
        }
        self.slots
            .insert(id.clone(), Slot::Processing { parked: None });
        true
    }

    /// Answer from the request task. Returns the frames to write, in order.
    pub fn reply(&mut self, response: Response) -> Result<Vec<Response>, DropReason> {
        let id = response.id().clone();
        let Some(slot) = self.slots.get_mut(&id) else {
            return Err(DropReason::UnknownId);
        };
        let parked = match slot {
            Slot::Deferred => return Err(DropReason::AlreadyAnswered),
            Slot::Processing { parked } => parked.take(),
        };

        if !response.is_deferred() {
            self.slots.remove(&id);
            return Ok(vec![response]);
        }

        match parked {
            Some(terminal) => {
                self.slots.remove(&id);
                Ok(vec![response, terminal])
            }
            None => {
                *slot = Slot::Deferred;
                Ok(vec![response])
            }
        }
    }

    /// Late terminal answer. Returns the frames to write now (possibly none).
    pub fn deliver(&mut self, response: Response) -> Result<Vec<Response>, DropReason> {
        if response.is_deferred() {
            return Err(DropReason::NotTerminal);
        }
        let id = response.id().clone();
        match self.slots.get_mut(&id) {
            None => Err(DropReason::UnknownId),
            Some(Slot::Processing { parked: Some(_) }) => Err(DropReason::AlreadyParked),
            Some(Slot::Processing { parked }) => {
                *parked = Some(response);
                Ok(Vec::new())
            }
            Some(Slot::Deferred) => {
                self.slots.remove(&id);
                Ok(vec![response])
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
