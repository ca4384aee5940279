//! Transaction records and the updates the UI sends for them.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    New,
    Pending,
    Submitting,
    Signed,
    Error,
    ErrorUserCanceled,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Pending => "pending",
            Self::Submitting => "submitting",
            Self::Signed => "signed",
            Self::Error => "error",
            Self::ErrorUserCanceled => "error_user_canceled",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Signed | Self::Error | Self::ErrorUserCanceled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub status: TxStatus,
    pub tx_params: TxParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub display_values: Value,
}

/// Gas settings edited on the confirmation screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParamsPatch {
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default, alias = "gas")]
    pub gas_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxUpdate {
    Status { id: String, status: TxStatus },
    Params { id: String, params: TxParamsPatch },
    Finalized { id: String, tx_hash: Option<String>, error: Option<String> },
}

impl TxUpdate {
    /// Recognize one of the three update shapes. `None` for anything else.
    pub fn parse(value: &Value) -> Option<Self> {
        let id = value.get("id")?.as_str()?.to_string();
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        if value.get("txHash").is_some() || value.get("error").is_some() {
            let tx_hash = text("txHash");
            let error = text("error");
            if tx_hash.is_none() && error.is_none() {
                return None;
            }
            return Some(Self::Finalized { id, tx_hash, error });
        }
        if let Some(params) = value.get("params") {
            let params = serde_json::from_value(params.clone()).ok()?;
            return Some(Self::Params { id, params });
        }
        let status = serde_json::from_value(value.get("status")?.clone()).ok()?;
        Some(Self::Status { id, status })
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Status { id, .. } | Self::Params { id, .. } | Self::Finalized { id, .. } => id,
        }
    }

    pub fn is_submit(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: TxStatus::Submitting,
                ..
            }
        )
    }
}
