//! Decisions sent by the approval surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{ActionId, ActionStatus};

/// `action_updateStatus` payload.
///
/// `submitting` approves, `error`/`error_user_canceled` rejects. A pending
/// status with `displayData` only edits what the surface shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionUpdate {
    pub id: ActionId,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Why the user declined; returned as the rejection's `data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_data: Option<Value>,
}

impl ActionUpdate {
    pub fn approve(id: ActionId, result: Option<Value>) -> Self {
        Self {
            id,
            status: ActionStatus::Approved,
            result,
            error: None,
            display_data: None,
        }
    }

    pub fn reject(id: ActionId) -> Self {
        Self {
            id,
            status: ActionStatus::Rejected,
            result: None,
            error: None,
            display_data: None,
        }
    }
}
