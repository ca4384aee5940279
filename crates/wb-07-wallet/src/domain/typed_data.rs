//! Format checks for signing payloads.

use crate::domain::message::MessageType;
use crate::error::{WalletError, WalletResult};
use serde_json::{Map, Value};

/// Reject payloads the signer could not interpret at all.
pub fn ensure_message_format_is_valid(
    kind: MessageType,
    data: &Value,
    active_chain_id: u64,
) -> WalletResult<()> {
    let invalid = |message: &str| Err(WalletError::InvalidMessage(message.to_string()));
    match kind {
        MessageType::EthSign | MessageType::PersonalSign => {
            if !data.is_string() {
                return invalid("message data must be a string");
            }
        }
        MessageType::SignTypedData | MessageType::SignTypedDataV1 => {
            let well_formed = data.as_array().is_some_and(|entries| {
                entries.iter().all(|entry| {
                    entry.get("type").is_some_and(Value::is_string)
                        && entry.get("name").is_some_and(Value::is_string)
                })
            });
            if !well_formed {
                return invalid("typed data must be an array of {type, name, value}");
            }
        }
        MessageType::SignTypedDataV3 | MessageType::SignTypedDataV4 => {
            if !data.is_object() {
                return invalid("typed data must be an object");
            }
            let Some(raw) = data.pointer("/domain/chainId") else {
                return Ok(());
            };
            let chain_id = match raw {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => parse_number(s),
                _ => None,
            };
            if chain_id != Some(active_chain_id) {
                let shown = raw.as_str().map_or_else(|| raw.to_string(), str::to_string);
                return Err(WalletError::InvalidMessage(format!(
                    "Provided chainId \"{shown}\" must match the active chainId \"{active_chain_id}\""
                )));
            }
        }
    }
    Ok(())
}

/// EIP-712 structural validation. Failures are reported, not fatal.
pub fn validate_typed_data(data: &Value) -> Result<(), String> {
    let types = data
        .get("types")
        .and_then(Value::as_object)
        .ok_or("types must be an object")?;
    let primary = data
        .get("primaryType")
        .and_then(Value::as_str)
        .ok_or("primaryType is required")?;
    if !data.get("domain").is_some_and(Value::is_object) {
        return Err("domain must be an object".into());
    }
    let message = data
        .get("message")
        .and_then(Value::as_object)
        .ok_or("message must be an object")?;

    for (name, fields) in types {
        let fields = fields
            .as_array()
            .ok_or_else(|| format!("type {name} must list its fields"))?;
        for field in fields {
            let field_name = field.get("name").and_then(Value::as_str);
            let field_type = field.get("type").and_then(Value::as_str);
            let (Some(field_name), Some(field_type)) = (field_name, field_type) else {
                return Err(format!("type {name} has a malformed field"));
            };
            if !is_known_type(field_type, types) {
                return Err(format!("unknown type {field_type} for {name}.{field_name}"));
            }
        }
    }

    if primary != "EIP712Domain" {
        let fields = types
            .get(primary)
            .and_then(Value::as_array)
            .ok_or_else(|| format!("primaryType {primary} is not defined"))?;
        for field in fields {
            if let Some(name) = field.get("name").and_then(Value::as_str) {
                if !message.contains_key(name) {
                    return Err(format!("missing value for field {name}"));
                }
            }
        }
    }

    if let Some(contract) = data.pointer("/domain/verifyingContract") {
        let valid = contract.as_str().is_some_and(is_address);
        if !valid {
            return Err(format!("invalid verifyingContract {contract}"));
        }
    }
    Ok(())
}

fn is_known_type(ty: &str, types: &Map<String, Value>) -> bool {
    let base = ty.split('[').next().unwrap_or(ty);
    if types.contains_key(base) {
        return true;
    }
    match base {
        "address" | "bool" | "string" | "bytes" => true,
        _ => {
            let sized = |prefix: &str, max: u32, step: u32| {
                base.strip_prefix(prefix)
                    .and_then(|bits| bits.parse::<u32>().ok())
                    .is_some_and(|bits| bits > 0 && bits <= max && bits % step == 0)
            };
            sized("uint", 256, 8) || sized("int", 256, 8) || sized("bytes", 32, 1)
        }
    }
}

fn is_address(s: &str) -> bool {
    s.strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn parse_number(s: &str) -> Option<u64> {
    match s.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
