use crate::error::NetworkResult;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Asks an RPC endpoint which chain it serves (`eth_chainId`).
#[async_trait]
pub trait ChainIdProbe: Send + Sync {
    async fn chain_id(
        &self,
        rpc_url: &str,
        headers: Option<&BTreeMap<String, String>>,
    ) -> NetworkResult<u64>;
}
