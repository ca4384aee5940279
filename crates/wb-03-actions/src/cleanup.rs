//! Periodic expiry of abandoned actions.

use crate::service::ActionService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Reject actions older than `max_age_secs` every `interval`.
pub async fn cleanup_task(service: Arc<ActionService>, interval: Duration, max_age_secs: u64) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        match service.expire_older_than(max_age_secs).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed = removed, "Expired abandoned actions"),
            Err(e) => error!(error = %e, "Action expiry failed"),
        }
    }
}
