//! Positional `swap_performSwap` params.

use crate::error::SwapError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::RpcError;

/// Symbol of the native token.
pub const AVAX_SYMBOL: &str = "AVAX";

/// Placeholder address aggregators use for the native token.
pub const ETHER_ADDRESS: &str = "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Sell,
    Buy,
}

/// The aggregator quote, kept whole for the build call.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRoute {
    pub side: Side,
    pub dest_amount: U256,
    pub raw: Value,
}

impl PriceRoute {
    fn from_value(raw: &Value) -> Result<Self, SwapError> {
        let side = raw
            .get("side")
            .cloned()
            .map(serde_json::from_value::<Side>)
            .transpose()
            .map_err(|e| SwapError::Upstream(format!("invalid priceRoute side: {e}")))?
            .unwrap_or(Side::Sell);
        let dest_amount = raw
            .get("destAmount")
            .and_then(to_u256)
            .ok_or_else(|| SwapError::InvalidAmount("priceRoute.destAmount".into()))?;
        Ok(Self {
            side,
            dest_amount,
            raw: raw.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapParams {
    pub src_token: String,
    pub dest_token: String,
    pub src_decimals: u8,
    pub dest_decimals: u8,
    pub src_amount: U256,
    pub price_route: PriceRoute,
    pub dest_amount: U256,
    pub gas_limit: u64,
    pub gas_price: Option<U256>,
    /// Percent, e.g. `0.5`.
    pub slippage: f64,
}

impl SwapParams {
    /// Parse `[srcToken, destToken, srcDecimals, destDecimals, srcAmount,
    /// priceRoute, destAmount, gasLimit, gasPrice, slippage]`.
    pub fn from_params(params: Option<&Value>) -> Result<Self, RpcError> {
        let empty = Vec::new();
        let items = params.and_then(Value::as_array).unwrap_or(&empty);
        let at = |i: usize| items.get(i).filter(|v| !is_falsy(v));

        let src_token = at(0).ok_or_else(|| RpcError::message("no source token on request"))?;
        let dest_token = at(1).ok_or_else(|| RpcError::message("no destination token on request"))?;
        let src_amount = at(4).ok_or_else(|| RpcError::message("no amount on request"))?;
        let src_decimals = at(2).ok_or_else(|| {
            RpcError::message("request requires the decimals for source token")
        })?;
        let dest_decimals = at(3).ok_or_else(|| {
            RpcError::message("request requires the decimals for destination token")
        })?;
        let dest_amount = at(6).ok_or_else(|| {
            RpcError::message("request requires a destAmount expected for destination token")
        })?;
        let price_route =
            at(5).ok_or_else(|| RpcError::message("request requires the paraswap priceRoute"))?;
        let gas_limit = at(7).ok_or_else(|| {
            RpcError::message("request requires gas limit from paraswap response")
        })?;

        let invalid = |name: &str| RpcError::stringified(SwapError::InvalidAmount(name.into()));
        Ok(Self {
            src_token: token(src_token).ok_or_else(|| invalid("srcToken"))?,
            dest_token: token(dest_token).ok_or_else(|| invalid("destToken"))?,
            src_decimals: to_u8(src_decimals).ok_or_else(|| invalid("srcDecimals"))?,
            dest_decimals: to_u8(dest_decimals).ok_or_else(|| invalid("destDecimals"))?,
            src_amount: to_u256(src_amount).ok_or_else(|| invalid("srcAmount"))?,
            price_route: PriceRoute::from_value(price_route).map_err(RpcError::stringified)?,
            dest_amount: to_u256(dest_amount).ok_or_else(|| invalid("destAmount"))?,
            gas_limit: to_u256(gas_limit)
                .filter(|limit| *limit <= U256::from(u64::MAX))
                .map(|limit| limit.as_u64())
                .ok_or_else(|| invalid("gasLimit"))?,
            gas_price: items.get(8).and_then(gas_price),
            slippage: items.get(9).and_then(Value::as_f64).unwrap_or(0.0),
        })
    }

    pub fn is_native_source(&self) -> bool {
        self.src_token == AVAX_SYMBOL
    }

    pub fn src_address(&self) -> &str {
        token_address(&self.src_token)
    }

    pub fn dest_address(&self) -> &str {
        token_address(&self.dest_token)
    }
}

fn token_address(token: &str) -> &str {
    if token == AVAX_SYMBOL {
        ETHER_ADDRESS
    } else {
        token
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn token(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn to_u8(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Decimal or `0x` hex string, or a non-negative integer.
pub(crate) fn to_u256(value: &Value) -> Option<U256> {
    match value {
        Value::Number(n) => n.as_u64().map(U256::from),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16).ok(),
            None => U256::from_dec_str(s).ok(),
        },
        _ => None,
    }
}

/// `{ bn: "0x…" }` as sent by the UI, or a bare amount.
fn gas_price(value: &Value) -> Option<U256> {
    match value.get("bn") {
        Some(bn) => to_u256(bn),
        None => to_u256(value),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn params() -> Value {
        json!([
            "AVAX",
            "0xToken",
            18,
            6,
            "1000000000000000000",
            {"side": "SELL", "destAmount": "20000000"},
            "20000000",
            "210000",
            {"bn": "0x5d21dba00"},
            1
        ])
    }

    #[test]
    fn test_parses_positional_params() {
        let parsed = SwapParams::from_params(Some(&params())).unwrap();
        assert!(parsed.is_native_source());
        assert_eq!(parsed.src_address(), ETHER_ADDRESS);
        assert_eq!(parsed.dest_address(), "0xToken");
        assert_eq!(parsed.src_amount, U256::exp10(18));
        assert_eq!(parsed.price_route.side, Side::Sell);
        assert_eq!(parsed.gas_limit, 210_000);
        assert_eq!(parsed.gas_price, Some(U256::from(25_000_000_000u64)));
        assert_eq!(parsed.slippage, 1.0);
    }

    #[test]
    fn test_validation_order() {
        let cases = [
            (0, "no source token on request"),
            (1, "no destination token on request"),
            (4, "no amount on request"),
            (2, "request requires the decimals for source token"),
            (3, "request requires the decimals for destination token"),
            (6, "request requires a destAmount expected for destination token"),
            (5, "request requires the paraswap priceRoute"),
            (7, "request requires gas limit from paraswap response"),
        ];
        for (index, message) in cases {
            let mut raw = params();
            raw[index] = Value::Null;
            let err = SwapParams::from_params(Some(&raw)).unwrap_err();
            assert_eq!(err, RpcError::message(message), "param {index}");
        }
        assert_eq!(
            SwapParams::from_params(None).unwrap_err(),
            RpcError::message("no source token on request")
        );
    }

    #[test]
    fn test_zero_decimals_count_as_missing() {
        let mut raw = params();
        raw[2] = json!(0);
        assert_eq!(
            SwapParams::from_params(Some(&raw)).unwrap_err().message,
            "request requires the decimals for source token"
        );
    }
}
