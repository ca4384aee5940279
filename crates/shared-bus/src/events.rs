//! # Wallet Events
//!
//! State changes published by the background services.

use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{Account, ActionId, ActionStatus, ChainList, Network, Permissions, WindowId};

/// Event topics for filtering subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTopic {
    Permissions,
    Network,
    Accounts,
    Actions,
    Transactions,
    /// Matches every topic.
    All,
}

/// A state change published on the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum WalletEvent {
    /// The full permission map after a grant or revoke.
    PermissionsUpdated(Permissions),
    /// The active network changed.
    NetworkChanged(Network),
    /// The set of user-added networks changed.
    CustomNetworksUpdated(ChainList),
    /// Accounts were added or the active account changed.
    AccountsUpdated {
        accounts: Vec<Account>,
        active: Option<Account>,
    },
    /// An approval moved through its lifecycle.
    ActionUpdated {
        action_id: ActionId,
        status: ActionStatus,
    },
    /// An approval surface should be shown for `action_id`.
    ApprovalRequested {
        action_id: ActionId,
        window_id: WindowId,
        view: String,
    },
    /// A tracked transaction changed state.
    TransactionUpdated {
        id: String,
        status: String,
        tx_hash: Option<String>,
    },
}

impl WalletEvent {
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            WalletEvent::PermissionsUpdated(_) => EventTopic::Permissions,
            WalletEvent::NetworkChanged(_) | WalletEvent::CustomNetworksUpdated(_) => {
                EventTopic::Network
            }
            WalletEvent::AccountsUpdated { .. } => EventTopic::Accounts,
            WalletEvent::ActionUpdated { .. } | WalletEvent::ApprovalRequested { .. } => {
                EventTopic::Actions
            }
            WalletEvent::TransactionUpdated { .. } => EventTopic::Transactions,
        }
    }

    /// Service that owns the changed state.
    #[must_use]
    pub fn source(&self) -> &'static str {
        match self.topic() {
            EventTopic::Permissions => "permissions",
            EventTopic::Network => "network",
            EventTopic::Accounts => "accounts",
            EventTopic::Actions => "actions",
            EventTopic::Transactions => "transactions",
            EventTopic::All => "bus",
        }
    }

    /// Event name as delivered to extension connections.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::PermissionsUpdated(_) => "permissions_updated",
            WalletEvent::NetworkChanged(_) => "network_updated",
            WalletEvent::CustomNetworksUpdated(_) => "custom_networks_updated",
            WalletEvent::AccountsUpdated { .. } => "accounts_updated",
            WalletEvent::ActionUpdated { .. } => "action_updated",
            WalletEvent::ApprovalRequested { .. } => "approval_requested",
            WalletEvent::TransactionUpdated { .. } => "transaction_updated",
        }
    }

    /// Event payload as delivered to extension connections.
    #[must_use]
    pub fn value(&self) -> Value {
        match self {
            WalletEvent::PermissionsUpdated(permissions) => to_json(permissions),
            WalletEvent::NetworkChanged(network) => to_json(network),
            WalletEvent::CustomNetworksUpdated(networks) => to_json(networks),
            WalletEvent::AccountsUpdated { accounts, active } => {
                json!({ "accounts": accounts, "active": active })
            }
            WalletEvent::ActionUpdated { action_id, status } => {
                json!({ "actionId": action_id, "status": status })
            }
            WalletEvent::ApprovalRequested {
                action_id,
                window_id,
                view,
            } => json!({ "actionId": action_id, "windowId": window_id, "view": view }),
            WalletEvent::TransactionUpdated {
                id,
                status,
                tx_hash,
            } => json!({ "id": id, "status": status, "txHash": tx_hash }),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    #[must_use]
    pub fn matches(&self, event: &WalletEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
