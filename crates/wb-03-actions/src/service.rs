//! The action store and its lifecycle.

use crate::domain::stats::ActionStats;
use crate::domain::update::ActionUpdate;
use crate::error::{ActionError, ActionResult};
use crate::ports::{ActionCallbacks, ApprovalWindow};
use dashmap::DashMap;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use shared_bus::{EventPublisher, WalletEvent};
use shared_types::{
    keys, Action, ActionId, ActionStatus, Response, RpcError, StorageService, TimeSource, WindowId,
};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};
use wb_01_transport::ResponseSink;
use wb_02_dispatch::{ActionOutcome, ActionResolver, RequestContext};

type ActionMap = HashMap<ActionId, Action>;

/// Owner of every pending action in the process.
///
/// The in-memory map mirrors storage key `pending_actions`; every mutation is
/// written through while holding `write_gate`, so persisted snapshots are
/// never reordered.
pub struct ActionService {
    storage: StorageService,
    windows: Arc<dyn ApprovalWindow>,
    sink: Arc<dyn ResponseSink>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn TimeSource>,
    callbacks: OnceLock<Arc<dyn ActionCallbacks>>,
    cache: RwLock<Option<ActionMap>>,
    write_gate: tokio::sync::Mutex<()>,
    window_index: DashMap<WindowId, ActionId>,
    stats: ActionStats,
}

impl ActionService {
    pub fn new(
        storage: StorageService,
        windows: Arc<dyn ApprovalWindow>,
        sink: Arc<dyn ResponseSink>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            storage,
            windows,
            sink,
            events,
            clock,
            callbacks: OnceLock::new(),
            cache: RwLock::new(None),
            write_gate: tokio::sync::Mutex::new(()),
            window_index: DashMap::new(),
            stats: ActionStats::default(),
        }
    }

    /// Wire in handler lookup once the registries exist.
    pub fn attach(&self, callbacks: Arc<dyn ActionCallbacks>) -> ActionResult<()> {
        self.callbacks
            .set(callbacks)
            .map_err(|_| ActionError::CallbacksAlreadyAttached)
    }

    pub fn stats(&self) -> &ActionStats {
        &self.stats
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Register a pending action for `ctx` and show it to the user.
    pub async fn add_action(
        &self,
        ctx: &RequestContext,
        display_data: Value,
        view: &str,
    ) -> ActionResult<ActionId> {
        let action = Action {
            action_id: ActionId::new(),
            request: ctx.request.clone(),
            display_data,
            tab_id: ctx.tab_id(),
            connection_id: ctx.connection_id,
            view: view.to_string(),
            status: ActionStatus::Created,
            window_id: None,
            created_at: self.clock.now(),
        };
        let id = action.action_id;
        let method = action.request.method.clone();

        self.mutate(move |actions| {
            actions.insert(id, action);
            Ok(())
        })
        .await?;
        ActionStats::bump(&self.stats.created);
        info!(action_id = %id, method = %method, view = view, "Action created");
        self.publish(id, ActionStatus::Created).await;

        if let Err(e) = self.display(id).await {
            warn!(action_id = %id, error = %e, "Could not show approval window");
            self.mutate(|actions| {
                actions.remove(&id);
                Ok(())
            })
            .await?;
            return Err(e);
        }
        Ok(id)
    }

    /// Show the approval window for an action, focusing it if already open.
    pub async fn display(&self, id: ActionId) -> ActionResult<WindowId> {
        let action = self.get_action(&id).await?.ok_or(ActionError::NotFound(id))?;
        if !action.status.is_pending() {
            return Err(ActionError::AlreadyResolved(id));
        }

        if let Some(window) = action.window_id {
            if self.windows.focus(window).await? {
                debug!(action_id = %id, window_id = %window, "Focused existing approval window");
                return Ok(window);
            }
            self.window_index.remove(&window);
        }

        let window = self.windows.open(&id, &action.view).await?;
        self.mutate(|actions| {
            let action = actions.get_mut(&id).ok_or(ActionError::NotFound(id))?;
            if !action.status.is_pending() {
                return Err(ActionError::AlreadyResolved(id));
            }
            action.window_id = Some(window);
            action.status = ActionStatus::Displayed;
            Ok(())
        })
        .await?;
        self.window_index.insert(window, id);
        debug!(action_id = %id, window_id = %window, "Approval window opened");
        self.publish(id, ActionStatus::Displayed).await;
        Ok(window)
    }

    pub async fn get_action(&self, id: &ActionId) -> ActionResult<Option<Action>> {
        self.ensure_loaded().await?;
        Ok(self
            .cache
            .read()
            .as_ref()
            .and_then(|actions| actions.get(id).cloned()))
    }

    /// Every action still waiting on a decision, oldest first.
    pub async fn pending_actions(&self) -> ActionResult<Vec<Action>> {
        self.ensure_loaded().await?;
        let mut pending: Vec<Action> = self
            .cache
            .read()
            .iter()
            .flat_map(|actions| actions.values())
            .filter(|action| action.status.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|action| action.action_id);
        Ok(pending)
    }

    /// Apply a decision (or a display data edit) from the approval surface.
    ///
    /// The decision is persisted before the owning handler runs; the handler's
    /// outcome is delivered to the original caller and the record deleted.
    /// Settlement runs on its own task, so dropping the returned future (the
    /// approval connection closing, say) never strands the original caller.
    pub async fn update_action(self: &Arc<Self>, update: ActionUpdate) -> ActionResult<()> {
        let id = update.id;
        let status = update.status;
        match status {
            ActionStatus::Approved | ActionStatus::Rejected => {}
            ActionStatus::Created | ActionStatus::Displayed if update.display_data.is_some() => {
                let data = update.display_data.unwrap_or_default();
                return self.update_display_data(id, data).await;
            }
            other => return Err(ActionError::InvalidStatus(other)),
        }

        let action = self
            .mutate(|actions| {
                let action = actions.get_mut(&id).ok_or(ActionError::NotFound(id))?;
                if !action.status.is_pending() {
                    return Err(ActionError::AlreadyResolved(id));
                }
                action.status = status;
                Ok(action.clone())
            })
            .await?;

        if status == ActionStatus::Approved {
            ActionStats::bump(&self.stats.approved);
        } else {
            ActionStats::bump(&self.stats.rejected);
        }
        info!(action_id = %id, method = action.method(), status = %status, "Action decided");
        self.publish(id, status).await;

        let service = Arc::clone(self);
        let settlement = tokio::spawn(async move {
            let outcome = service.run_callback(action.clone(), status, update.result).await;
            let outcome = with_reject_reason(outcome, update.error);
            service.settle(action, outcome).await
        });
        settlement
            .await
            .map_err(|e| ActionError::Settlement(e.to_string()))?
    }

    /// The approval window went away: reject whatever it still showed.
    ///
    /// Returns `true` if an action was rejected.
    pub async fn on_window_closed(self: &Arc<Self>, window: WindowId) -> ActionResult<bool> {
        let Some((_, id)) = self.window_index.remove(&window) else {
            debug!(window_id = %window, "Closed window had no pending action");
            return Ok(false);
        };
        match self.update_action(ActionUpdate::reject(id)).await {
            Ok(()) => {
                info!(action_id = %id, window_id = %window, "Action rejected by window close");
                Ok(true)
            }
            Err(ActionError::AlreadyResolved(_) | ActionError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // HOUSEKEEPING
    // =========================================================================

    /// Drop actions persisted by an earlier process; their callers are gone.
    pub async fn purge_stale(&self) -> ActionResult<usize> {
        let removed = self
            .mutate(|actions| {
                let removed = actions.len();
                actions.clear();
                Ok(removed)
            })
            .await?;
        self.window_index.clear();
        if removed > 0 {
            info!(removed = removed, "Purged actions left over from a previous session");
        }
        Ok(removed)
    }

    /// Reject pending actions older than `max_age_secs`.
    pub async fn expire_older_than(self: &Arc<Self>, max_age_secs: u64) -> ActionResult<usize> {
        let now = self.clock.now();
        let expired: Vec<ActionId> = self
            .pending_actions()
            .await?
            .into_iter()
            .filter(|action| now.saturating_sub(action.created_at) > max_age_secs)
            .map(|action| action.action_id)
            .collect();

        let mut removed = 0;
        for id in expired {
            warn!(action_id = %id, max_age_secs = max_age_secs, "Expiring pending action");
            match self.update_action(ActionUpdate::reject(id)).await {
                Ok(()) => {
                    ActionStats::bump(&self.stats.expired);
                    removed += 1;
                }
                Err(ActionError::AlreadyResolved(_) | ActionError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn update_display_data(&self, id: ActionId, data: Value) -> ActionResult<()> {
        self.mutate(|actions| {
            let action = actions.get_mut(&id).ok_or(ActionError::NotFound(id))?;
            if !action.status.is_pending() {
                return Err(ActionError::AlreadyResolved(id));
            }
            action.display_data = data;
            Ok(())
        })
        .await?;
        debug!(action_id = %id, "Display data updated");
        Ok(())
    }

    async fn run_callback(
        &self,
        action: Action,
        status: ActionStatus,
        result: Option<Value>,
    ) -> ActionOutcome {
        let handler = self
            .callbacks
            .get()
            .and_then(|callbacks| callbacks.handler_for(action.method()));
        let Some(handler) = handler else {
            error!(method = action.method(), "No handler owns this action");
            return Err(RpcError::internal(format!(
                "no handler registered for {}",
                action.method()
            )));
        };

        let method = action.method().to_string();
        let (resolver, outcome) = ActionResolver::channel();
        let callback = if status == ActionStatus::Approved {
            handler.on_action_approved(action, result, resolver)
        } else {
            handler.on_action_rejected(action, resolver)
        };
        if AssertUnwindSafe(callback).catch_unwind().await.is_err() {
            error!(method = %method, "Action callback panicked");
            return Err(RpcError::internal(format!("{method} failed while settling the action")));
        }

        let outcome = outcome
            .await
            .unwrap_or_else(|_| Err(RpcError::internal("action resolver dropped without an outcome")));

        match (status, outcome) {
            (ActionStatus::Rejected, Ok(_)) => {
                warn!("Rejected action resolved successfully, answering with rejection");
                Err(RpcError::user_rejected())
            }
            (_, outcome) => outcome,
        }
    }

    async fn settle(&self, action: Action, outcome: ActionOutcome) -> ActionResult<()> {
        let id = action.action_id;
        let response = Response::from_result(action.request, outcome);
        if !self.sink.deliver(action.connection_id, response) {
            ActionStats::bump(&self.stats.undelivered);
            warn!(
                action_id = %id,
                connection_id = %action.connection_id,
                "Terminal response not delivered"
            );
        }

        self.mutate(|actions| {
            actions.remove(&id);
            Ok(())
        })
        .await?;
        if let Some(window) = action.window_id {
            self.window_index.remove(&window);
        }
        self.publish(id, ActionStatus::Resolved).await;
        info!(action_id = %id, "Action resolved");
        Ok(())
    }

    async fn publish(&self, action_id: ActionId, status: ActionStatus) {
        self.events
            .publish(WalletEvent::ActionUpdated { action_id, status })
            .await;
    }

    async fn ensure_loaded(&self) -> ActionResult<()> {
        if self.cache.read().is_some() {
            return Ok(());
        }
        let stored: ActionMap = self
            .storage
            .load(keys::PENDING_ACTIONS)
            .await?
            .unwrap_or_default();
        let mut cache = self.cache.write();
        if cache.is_none() {
            debug!(count = stored.len(), "Loaded pending actions");
            *cache = Some(stored);
        }
        Ok(())
    }

    /// Apply `f` to the map and persist the result.
    async fn mutate<R, F>(&self, f: F) -> ActionResult<R>
    where
        R: Send,
        F: FnOnce(&mut ActionMap) -> ActionResult<R> + Send,
    {
        let _gate = self.write_gate.lock().await;
        self.ensure_loaded().await?;
        let (out, snapshot) = {
            let mut cache = self.cache.write();
            let actions = cache.get_or_insert_with(HashMap::new);
            let out = f(actions)?;
            (out, actions.clone())
        };
        self.storage.save(keys::PENDING_ACTIONS, &snapshot).await?;
        Ok(out)
    }
}

/// Carry the approval surface's rejection reason on a user rejection.
fn with_reject_reason(outcome: ActionOutcome, reason: Option<String>) -> ActionOutcome {
    match (outcome, reason) {
        (Err(error), Some(reason)) if error.is_user_rejection() => {
            Err(error.with_data(Value::String(reason)))
        }
        (outcome, _) => outcome,
    }
}
