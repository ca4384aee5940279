//! DEX aggregator port.

use crate::error::SwapResult;
use async_trait::async_trait;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything the aggregator needs to build the swap transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTxRequest {
    pub network: String,
    pub src_token: String,
    pub dest_token: String,
    pub src_amount: U256,
    pub dest_amount: U256,
    pub price_route: Value,
    pub user_address: String,
    pub partner: String,
    pub src_decimals: u8,
    pub dest_decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBuildData {
    pub to: String,
    pub data: String,
    pub gas: u64,
}

#[async_trait]
pub trait SwapService: Send + Sync {
    /// Contract that must be allowed to spend the source token.
    async fn get_spender(&self) -> SwapResult<String>;

    /// ERC-20 `allowance(owner, spender)` of `token`.
    async fn allowance(&self, token: &str, owner: &str, spender: &str) -> SwapResult<U256>;

    /// Current gas price.
    async fn network_fee(&self) -> SwapResult<U256>;

    async fn build_tx(&self, request: &BuildTxRequest) -> SwapResult<TxBuildData>;
}
