//! Approval windows opened by the host in response to bus events.
//!
//! The runtime cannot create browser windows itself. Opening one allocates a
//! window id and publishes [`WalletEvent::ApprovalRequested`]; the extension
//! shell opens the popup, which connects back as the approval connection
//! with `?windowId=`. The window counts as open until that connection ends.
//! Opening fails when nothing is subscribed to receive the request.

use async_trait::async_trait;
use dashmap::DashMap;
use shared_bus::{EventPublisher, WalletEvent};
use shared_types::{ActionId, WindowId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};
use wb_03_actions::{ActionError, ActionResult, ApprovalWindow};

pub struct BusWindows {
    events: Arc<dyn EventPublisher>,
    next_id: AtomicU64,
    open: DashMap<WindowId, ActionId>,
}

impl BusWindows {
    pub fn new(events: Arc<dyn EventPublisher>) -> Self {
        Self {
            events,
            next_id: AtomicU64::new(1),
            open: DashMap::new(),
        }
    }

    /// Forget a window whose surface went away. Returns `false` if unknown.
    pub fn closed(&self, window: WindowId) -> bool {
        self.open.remove(&window).is_some()
    }

    pub fn is_open(&self, window: WindowId) -> bool {
        self.open.contains_key(&window)
    }
}

#[async_trait]
impl ApprovalWindow for BusWindows {
    async fn open(&self, action_id: &ActionId, view: &str) -> ActionResult<WindowId> {
        let window_id = WindowId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.open.insert(window_id, *action_id);
        let listeners = self
            .events
            .publish(WalletEvent::ApprovalRequested {
                action_id: *action_id,
                window_id,
                view: view.to_string(),
            })
            .await;
        if listeners == 0 {
            self.open.remove(&window_id);
            warn!(action_id = %action_id, window_id = %window_id, "No host is listening for approval windows");
            return Err(ActionError::Window("no host is listening for approval windows".into()));
        }
        debug!(action_id = %action_id, window_id = %window_id, view = view, "Approval window requested");
        Ok(window_id)
    }

    async fn focus(&self, window_id: WindowId) -> ActionResult<bool> {
        Ok(self.is_open(window_id))
    }
}
