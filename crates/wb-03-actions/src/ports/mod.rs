//! Outbound ports of the action service.

use crate::error::ActionResult;
use async_trait::async_trait;
use shared_types::{ActionId, WindowId};
use std::sync::Arc;
use wb_02_dispatch::{Pipeline, RequestHandler};

/// Host surface that shows an action to the user.
#[async_trait]
pub trait ApprovalWindow: Send + Sync {
    /// Open a window rendering `view` for the action.
    async fn open(&self, action_id: &ActionId, view: &str) -> ActionResult<WindowId>;

    /// Bring an existing window to front. `false` if it no longer exists.
    async fn focus(&self, window_id: WindowId) -> ActionResult<bool>;
}

/// Finds the handler that owns an action's method.
pub trait ActionCallbacks: Send + Sync {
    fn handler_for(&self, method: &str) -> Option<Arc<dyn RequestHandler>>;
}

impl ActionCallbacks for Pipeline {
    fn handler_for(&self, method: &str) -> Option<Arc<dyn RequestHandler>> {
        Pipeline::handler_for(self, method)
    }
}
