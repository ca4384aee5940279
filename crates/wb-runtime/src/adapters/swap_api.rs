//! # DEX Aggregator Adapter
//!
//! [`SwapService`] over a ParaSwap-style HTTP API, with chain reads
//! (allowance, gas price) sent to the active network's RPC.

use crate::adapters::json_rpc::{parse_quantity, JsonRpcClient};
use async_trait::async_trait;
use primitive_types::U256;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;
use wb_05_network::NetworkService;
use wb_08_swap::{allowance_calldata, BuildTxRequest, SwapError, SwapResult, SwapService, TxBuildData};

const SERVER_TOO_BUSY: &str = "Server too busy";

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

#[derive(Deserialize)]
struct BuildReply {
    to: String,
    data: String,
    #[serde(default)]
    gas: Option<Value>,
}

pub struct HttpSwapService {
    http: reqwest::Client,
    api: Url,
    rpc: JsonRpcClient,
    networks: Arc<NetworkService>,
}

impl HttpSwapService {
    pub fn new(http: reqwest::Client, api: Url, rpc: JsonRpcClient, networks: Arc<NetworkService>) -> Self {
        Self {
            http,
            api,
            rpc,
            networks,
        }
    }

    fn endpoint(&self, path: &str) -> SwapResult<Url> {
        self.api
            .join(path)
            .map_err(|e| SwapError::Upstream(format!("invalid aggregator url: {e}")))
    }

    async fn active_chain(&self) -> SwapResult<shared_types::Network> {
        self.networks
            .active_network()
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))?
            .ok_or_else(|| SwapError::Upstream("no active network".into()))
    }

    async fn chain_call(&self, method: &str, params: Value) -> SwapResult<U256> {
        let network = self.active_chain().await?;
        self.rpc
            .quantity(&network.rpc_url, network.custom_rpc_headers.as_ref(), method, params)
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))
    }
}

/// Aggregator failure body, with the busy signal kept distinguishable.
async fn upstream_error(response: reqwest::Response) -> SwapError {
    let status = response.status();
    match response.json::<ErrorReply>().await {
        Ok(reply) if reply.error == SERVER_TOO_BUSY => SwapError::ServerTooBusy,
        Ok(reply) => SwapError::Upstream(reply.error),
        Err(_) => SwapError::Upstream(format!("aggregator responded with {status}")),
    }
}

/// Gas limit as a JSON number, decimal string or hex string.
fn parse_gas(value: Option<&Value>) -> SwapResult<u64> {
    let invalid = || SwapError::Upstream(format!("invalid gas in build reply: {value:?}"));
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n.as_u64().ok_or_else(invalid),
        Some(Value::String(s)) if s.starts_with("0x") => {
            let gas = parse_quantity(&Value::String(s.clone())).map_err(|_| invalid())?;
            if gas > U256::from(u64::MAX) {
                return Err(invalid());
            }
            Ok(gas.low_u64())
        }
        Some(Value::String(s)) => s.parse().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

#[async_trait]
impl SwapService for HttpSwapService {
    async fn get_spender(&self) -> SwapResult<String> {
        let network = self.active_chain().await?;
        let mut url = self.endpoint("adapters/contracts")?;
        url.query_pairs_mut()
            .append_pair("network", &network.chain_id.to_string());

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        let contracts: Value = response
            .json()
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))?;
        contracts["TokenTransferProxy"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| SwapError::Upstream("aggregator returned no spender".into()))
    }

    async fn allowance(&self, token: &str, owner: &str, spender: &str) -> SwapResult<U256> {
        let data = allowance_calldata(owner, spender)
            .ok_or_else(|| SwapError::Upstream(format!("invalid owner {owner} or spender {spender}")))?;
        self.chain_call("eth_call", json!([{ "to": token, "data": data }, "latest"]))
            .await
    }

    async fn network_fee(&self) -> SwapResult<U256> {
        self.chain_call("eth_gasPrice", json!([])).await
    }

    async fn build_tx(&self, request: &BuildTxRequest) -> SwapResult<TxBuildData> {
        let mut url = self.endpoint(&format!("transactions/{}", request.network))?;
        url.query_pairs_mut().append_pair("ignoreChecks", "true");

        debug!(network = %request.network, src = %request.src_token, dest = %request.dest_token, "Building swap transaction");
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))?;
        if !response.status().is_success() {
            let error = upstream_error(response).await;
            if error.is_retryable() {
                warn!("Aggregator busy");
            }
            return Err(error);
        }
        let reply: BuildReply = response
            .json()
            .await
            .map_err(|e| SwapError::Upstream(e.to_string()))?;
        Ok(TxBuildData {
            to: reply.to,
            data: reply.data,
            gas: parse_gas(reply.gas.as_ref())?,
        })
    }
}
