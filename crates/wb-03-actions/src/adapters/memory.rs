//! In-process approval windows for tests and headless hosts.

use crate::error::ActionResult;
use crate::ports::ApprovalWindow;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{ActionId, WindowId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Records every window it is asked to open.
#[derive(Default)]
pub struct InMemoryWindows {
    next: AtomicU64,
    opened: Mutex<Vec<(ActionId, String, WindowId)>>,
    open: Mutex<HashSet<WindowId>>,
}

impl InMemoryWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Windows opened so far: `(action, view, window)`.
    pub fn opened(&self) -> Vec<(ActionId, String, WindowId)> {
        self.opened.lock().clone()
    }

    pub fn last_opened(&self) -> Option<(ActionId, String, WindowId)> {
        self.opened.lock().last().cloned()
    }

    /// Simulate the user closing a window. Returns `false` if it was not open.
    pub fn close(&self, window: WindowId) -> bool {
        self.open.lock().remove(&window)
    }

    pub fn is_open(&self, window: WindowId) -> bool {
        self.open.lock().contains(&window)
    }
}

#[async_trait]
impl ApprovalWindow for InMemoryWindows {
    async fn open(&self, action_id: &ActionId, view: &str) -> ActionResult<WindowId> {
        let window = WindowId(self.next.fetch_add(1, Ordering::SeqCst) + 1);
        self.opened.lock().push((*action_id, view.to_string(), window));
        self.open.lock().insert(window);
        Ok(window)
    }

    async fn focus(&self, window_id: WindowId) -> ActionResult<bool> {
        Ok(self.is_open(window_id))
    }
}
