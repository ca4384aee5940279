//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `ActionId`, `ConnectionId`, `WindowId`
//! - **Approvals**: `Action`, `ActionStatus`
//! - **Access**: `DappPermissions`, `Permissions`
//! - **Chains**: `Network`, `NetworkToken`, `ChainList`
//! - **Accounts**: `Account`, `AccountKind`

use crate::rpc::Request;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// =============================================================================
// IDENTITY
// =============================================================================

/// Identifier of a pending approval.
///
/// UUID v7, so identifiers sort by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ActionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Process-local identifier of a physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Host identifier of an approval window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// APPROVALS
// =============================================================================

/// Lifecycle of an [`Action`].
///
/// `Created -> Displayed -> {Approved | Rejected} -> Resolved`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionStatus {
    #[serde(rename = "pending")]
    Created,
    #[serde(rename = "displayed")]
    Displayed,
    #[serde(rename = "submitting")]
    Approved,
    #[serde(rename = "error_user_canceled", alias = "error")]
    Rejected,
    #[serde(rename = "completed")]
    Resolved,
}

impl ActionStatus {
    /// Still waiting on a user decision.
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Created | ActionStatus::Displayed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Created => "pending",
            ActionStatus::Displayed => "displayed",
            ActionStatus::Approved => "submitting",
            ActionStatus::Rejected => "error_user_canceled",
            ActionStatus::Resolved => "completed",
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request waiting on user approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub action_id: ActionId,
    #[serde(flatten)]
    pub request: Request,
    /// Handler-specific data rendered by the approval surface.
    pub display_data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<u32>,
    pub connection_id: ConnectionId,
    /// Approval surface route, e.g. `sign` or `network/switch`.
    pub view: String,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

impl Action {
    pub fn method(&self) -> &str {
        &self.request.method
    }
}

// =============================================================================
// ACCESS
// =============================================================================

/// Accounts a site may see, keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappPermissions {
    pub domain: String,
    pub accounts: BTreeMap<String, bool>,
}

impl DappPermissions {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            accounts: BTreeMap::new(),
        }
    }

    pub fn is_granted(&self, address: &str) -> bool {
        self.accounts
            .iter()
            .any(|(granted, allowed)| *allowed && granted.eq_ignore_ascii_case(address))
    }

    pub fn has_any_grant(&self) -> bool {
        self.accounts.values().any(|allowed| *allowed)
    }
}

/// Permission records keyed by domain.
pub type Permissions = BTreeMap<String, DappPermissions>;

// =============================================================================
// CHAINS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum NetworkVm {
    #[default]
    Evm,
    Bitcoin,
}

/// Native currency of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NetworkToken {
    pub symbol: String,
    pub decimals: u8,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub chain_id: u64,
    pub chain_name: String,
    #[serde(default)]
    pub vm_name: NetworkVm,
    pub rpc_url: String,
    pub network_token: NetworkToken,
    #[serde(default)]
    pub logo_uri: String,
    #[serde(default)]
    pub explorer_url: String,
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub is_testnet: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_rpc_headers: Option<BTreeMap<String, String>>,
}

impl Network {
    /// `0x`-prefixed chain id as reported by `eth_chainId`.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

/// Networks keyed by chain id.
pub type ChainList = BTreeMap<u64, Network>;

// =============================================================================
// ACCOUNTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Primary,
    Imported,
    WalletConnect,
    Fireblocks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "addressC")]
    pub address_c: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
}
