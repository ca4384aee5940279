//! Message-signing request shapes.

use crate::error::{WalletError, WalletResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "eth_sign")]
    EthSign,
    #[serde(rename = "personal_sign")]
    PersonalSign,
    #[serde(rename = "eth_signTypedData")]
    SignTypedData,
    #[serde(rename = "eth_signTypedData_v1")]
    SignTypedDataV1,
    #[serde(rename = "eth_signTypedData_v3")]
    SignTypedDataV3,
    #[serde(rename = "eth_signTypedData_v4")]
    SignTypedDataV4,
}

impl MessageType {
    pub const METHODS: &'static [&'static str] = &[
        "eth_sign",
        "personal_sign",
        "eth_signTypedData",
        "eth_signTypedData_v1",
        "eth_signTypedData_v3",
        "eth_signTypedData_v4",
    ];

    pub fn from_method(method: &str) -> Option<Self> {
        Some(match method {
            "eth_sign" => Self::EthSign,
            "personal_sign" => Self::PersonalSign,
            "eth_signTypedData" => Self::SignTypedData,
            "eth_signTypedData_v1" => Self::SignTypedDataV1,
            "eth_signTypedData_v3" => Self::SignTypedDataV3,
            "eth_signTypedData_v4" => Self::SignTypedDataV4,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EthSign => "eth_sign",
            Self::PersonalSign => "personal_sign",
            Self::SignTypedData => "eth_signTypedData",
            Self::SignTypedDataV1 => "eth_signTypedData_v1",
            Self::SignTypedDataV3 => "eth_signTypedData_v3",
            Self::SignTypedDataV4 => "eth_signTypedData_v4",
        }
    }

    /// `true` when the address comes first in `params`.
    fn address_first(&self) -> bool {
        matches!(self, Self::EthSign | Self::SignTypedDataV3 | Self::SignTypedDataV4)
    }

    /// v3/v4 typed data: an EIP-712 object, possibly JSON-encoded.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::SignTypedDataV3 | Self::SignTypedDataV4)
    }

    /// Legacy typed data: a list of `{type, name, value}`.
    pub fn is_legacy_typed(&self) -> bool {
        matches!(self, Self::SignTypedData | Self::SignTypedDataV1)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signer address and payload, normalized from positional params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageParams {
    pub from: String,
    pub data: Value,
}

impl MessageParams {
    pub fn from_params(kind: MessageType, params: Option<&Value>) -> WalletResult<Self> {
        let items = params
            .and_then(Value::as_array)
            .filter(|items| items.len() >= 2)
            .ok_or_else(|| WalletError::InvalidMessage("missing message params".into()))?;

        let (from, data) = if kind.address_first() {
            (&items[0], &items[1])
        } else {
            (&items[1], &items[0])
        };
        let from = from
            .as_str()
            .ok_or_else(|| WalletError::InvalidMessage("invalid from address".into()))?
            .to_string();

        // v3/v4 payloads are usually sent JSON-encoded.
        let data = match (kind.is_structured(), data) {
            (true, Value::String(encoded)) => serde_json::from_str(encoded)
                .map_err(|e| WalletError::InvalidMessage(format!("invalid typed data: {e}")))?,
            _ => data.clone(),
        };
        Ok(Self { from, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_order_by_method() {
        let personal =
            MessageParams::from_params(MessageType::PersonalSign, Some(&json!(["0xdead", "0xabc"])))
                .unwrap();
        assert_eq!(personal.from, "0xabc");
        assert_eq!(personal.data, json!("0xdead"));

        let eth_sign =
            MessageParams::from_params(MessageType::EthSign, Some(&json!(["0xabc", "0xdead"])))
                .unwrap();
        assert_eq!(eth_sign.from, "0xabc");
    }

    #[test]
    fn test_v4_payload_is_decoded() {
        let encoded = json!({"domain": {"chainId": 1}}).to_string();
        let params = MessageParams::from_params(
            MessageType::SignTypedDataV4,
            Some(&json!(["0xabc", encoded])),
        )
        .unwrap();
        assert_eq!(params.data["domain"]["chainId"], 1);
    }

    #[test]
    fn test_missing_params() {
        assert!(MessageParams::from_params(MessageType::PersonalSign, None).is_err());
        assert!(MessageParams::from_params(MessageType::PersonalSign, Some(&json!(["x"]))).is_err());
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in MessageType::METHODS {
            assert_eq!(MessageType::from_method(method).unwrap().as_str(), *method);
        }
        assert_eq!(MessageType::from_method("eth_sendTransaction"), None);
    }
}
