//! `swap_performSwap` (extension).

use crate::domain::amounts::{apply_slippage, approve_calldata, slippage_bps};
use crate::domain::params::{Side, SwapParams, AVAX_SYMBOL};
use crate::ports::{BuildTxRequest, SwapService};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde_json::json;
use shared_types::RpcError;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};
use wb_05_network::NetworkService;
use wb_07_wallet::{CustomTx, WalletService};

const NATIVE_DECIMALS: u8 = 18;
const PARTNER: &str = "Avalanche";

pub struct PerformSwapHandler {
    swap: Arc<dyn SwapService>,
    networks: Arc<NetworkService>,
    wallet: Arc<dyn WalletService>,
    retry: RetryPolicy,
}

impl PerformSwapHandler {
    pub fn new(
        swap: Arc<dyn SwapService>,
        networks: Arc<NetworkService>,
        wallet: Arc<dyn WalletService>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            swap,
            networks,
            wallet,
            retry,
        }
    }
}

fn prefixed(prefix: &str, error: impl std::fmt::Display) -> RpcError {
    RpcError::message(format!("{prefix}: {error}"))
}

#[async_trait]
impl RequestHandler for PerformSwapHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["swap_performSwap"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let params = SwapParams::from_params(ctx.request.params.as_ref())?;
        let default_gas_price = self
            .swap
            .network_fee()
            .await
            .map_err(RpcError::stringified)?;

        let network = self.networks.active_network().await?;
        if network.is_none() || !self.networks.is_mainnet().await? {
            return Err(RpcError::message("Network Init Error: Wrong network"));
        }
        let user_address = self
            .wallet
            .c_address()
            .await
            .ok_or_else(|| RpcError::message("Wallet Error: address not defined"))?;
        let network_id = network.map(|n| n.chain_id.to_string()).unwrap_or_default();

        let spender = self
            .swap
            .get_spender()
            .await
            .map_err(RpcError::stringified)?;

        let bps = slippage_bps(params.slippage);
        let (source_amount, destination_amount) = match params.price_route.side {
            Side::Sell => (
                params.src_amount,
                apply_slippage(params.price_route.dest_amount, bps, false),
            ),
            Side::Buy => (
                apply_slippage(params.src_amount, bps, true),
                params.price_route.dest_amount,
            ),
        };

        let mut approve_tx_hash = None;
        if !params.is_native_source() {
            let allowance = self
                .swap
                .allowance(params.src_address(), &user_address, &spender)
                .await
                .map_err(|e| prefixed("Allowance Error", e))?;

            if allowance < source_amount {
                debug!(
                    token = params.src_address(),
                    %allowance,
                    needed = %source_amount,
                    "Allowance short, approving"
                );
                let data = approve_calldata(&spender, source_amount)
                    .ok_or_else(|| prefixed("Approve Error", format!("invalid spender {spender}")))?;
                let hash = self
                    .wallet
                    .send_custom_tx(CustomTx {
                        to: params.src_address().to_string(),
                        gas_price: default_gas_price,
                        gas_limit: params.gas_limit,
                        data: Some(data),
                        value: None,
                    })
                    .await
                    .map_err(|e| prefixed("Approve Error", e))?;
                approve_tx_hash = Some(hash);
            }
        }

        let build = BuildTxRequest {
            network: network_id,
            src_token: params.src_address().to_string(),
            dest_token: params.dest_address().to_string(),
            src_amount: source_amount,
            dest_amount: destination_amount,
            price_route: params.price_route.raw.clone(),
            user_address,
            partner: PARTNER.to_string(),
            src_decimals: if params.is_native_source() {
                NATIVE_DECIMALS
            } else {
                params.src_decimals
            },
            dest_decimals: if params.dest_token == AVAX_SYMBOL {
                NATIVE_DECIMALS
            } else {
                params.dest_decimals
            },
        };
        let tx_data = self
            .retry
            .run(|| self.swap.build_tx(&build))
            .await
            .map_err(|e| {
                warn!(error = %e, "Swap transaction build failed");
                prefixed("Data Error", e)
            })?;

        let swap_tx_hash = self
            .wallet
            .send_custom_tx(CustomTx {
                to: tx_data.to,
                gas_price: params.gas_price.unwrap_or(default_gas_price),
                gas_limit: tx_data.gas,
                data: Some(tx_data.data),
                value: params.is_native_source().then_some(source_amount),
            })
            .await
            .map_err(|e| prefixed("Tx Error", e))?;

        info!(
            swap_tx_hash = %swap_tx_hash,
            approved = approve_tx_hash.is_some(),
            "Swap submitted"
        );
        Ok(HandlerOutcome::Result(json!({
            "swapTxHash": swap_tx_hash,
            "approveTxHash": approve_tx_hash,
        })))
    }
}
