//! Minimal EVM JSON-RPC client over HTTP.

use async_trait::async_trait;
use primitive_types::U256;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::debug;
use wb_05_network::{ChainIdProbe, NetworkError, NetworkResult};

#[derive(Debug, Error)]
pub enum RpcClientError {
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected rpc result: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct RpcReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcReplyError>,
}

#[derive(Debug, Deserialize)]
struct RpcReplyError {
    code: i64,
    message: String,
}

#[derive(Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    next_id: std::sync::Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            next_id: std::sync::Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn call(
        &self,
        url: &str,
        headers: Option<&BTreeMap<String, String>>,
        method: &str,
        params: Value,
    ) -> Result<Value, RpcClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut request = self.http.post(url).json(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }));
        for (name, value) in headers.into_iter().flatten() {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(url = url, method = method, "Upstream rpc call");
        let http_error = |e: reqwest::Error| RpcClientError::Http {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let reply: RpcReply = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(http_error)?
            .json()
            .await
            .map_err(http_error)?;

        if let Some(error) = reply.error {
            return Err(RpcClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        reply
            .result
            .ok_or_else(|| RpcClientError::Decode(format!("{method} returned no result")))
    }

    /// Call a method whose result is a hex quantity.
    pub async fn quantity(
        &self,
        url: &str,
        headers: Option<&BTreeMap<String, String>>,
        method: &str,
        params: Value,
    ) -> Result<U256, RpcClientError> {
        let result = self.call(url, headers, method, params).await?;
        parse_quantity(&result)
    }
}

/// `0x`-prefixed hex quantity or data word.
pub fn parse_quantity(value: &Value) -> Result<U256, RpcClientError> {
    let text = value
        .as_str()
        .ok_or_else(|| RpcClientError::Decode(format!("expected hex string, got {value}")))?;
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| RpcClientError::Decode(format!("missing 0x prefix in {text}")))?;
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|e| RpcClientError::Decode(format!("{text}: {e}")))
}

/// Answers [`ChainIdProbe`] with a live `eth_chainId` call.
pub struct RpcChainIdProbe {
    client: JsonRpcClient,
}

impl RpcChainIdProbe {
    pub fn new(client: JsonRpcClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChainIdProbe for RpcChainIdProbe {
    async fn chain_id(
        &self,
        rpc_url: &str,
        headers: Option<&BTreeMap<String, String>>,
    ) -> NetworkResult<u64> {
        let chain_id = self
            .client
            .quantity(rpc_url, headers, "eth_chainId", json!([]))
            .await
            .map_err(|e| NetworkError::Probe(e.to_string()))?;
        if chain_id > U256::from(u64::MAX) {
            return Err(NetworkError::Probe(format!("chain id {chain_id} out of range")));
        }
        Ok(chain_id.low_u64())
    }
}
