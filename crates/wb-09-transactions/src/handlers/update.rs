use crate::domain::TxUpdate;
use crate::service::TransactionsService;
use async_trait::async_trait;
use serde_json::Value;
use shared_types::RpcError;
use std::sync::Arc;
use tracing::debug;
use wb_02_dispatch::{HandlerOutcome, HandlerResult, RequestContext, RequestHandler};

/// `transactions_updateTransaction`, params `[update]`.
pub struct UpdateTransactionHandler {
    transactions: Arc<TransactionsService>,
}

impl UpdateTransactionHandler {
    pub fn new(transactions: Arc<TransactionsService>) -> Self {
        Self { transactions }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::internal(e.to_string()))
}

#[async_trait]
impl RequestHandler for UpdateTransactionHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["transactions_updateTransaction"]
    }

    async fn handle_authenticated(&self, ctx: &RequestContext) -> HandlerResult {
        let params = ctx
            .request
            .params
            .as_ref()
            .filter(|params| !params.is_null())
            .ok_or_else(|| RpcError::message("no params on request"))?;
        let raw = params
            .get(0)
            .filter(|update| !update.is_null())
            .ok_or_else(|| RpcError::message("no updates found in params"))?;
        let update =
            TxUpdate::parse(raw).ok_or_else(|| RpcError::message("malformed or unsupported update"))?;

        let id = update.id().to_string();
        let submitting = update.is_submit();
        let pending = self
            .transactions
            .apply(update)
            .await
            .map_err(RpcError::stringified)?;

        if submitting {
            debug!(tx_id = %id, "Waiting for submitted transaction");
            let tx = self
                .transactions
                .wait_finalized(&id)
                .await
                .ok_or_else(|| RpcError::internal("transaction tracker closed"))?;
            return match (&tx.tx_hash, &tx.error) {
                (Some(_), _) => Ok(HandlerOutcome::Result(to_value(&tx)?)),
                (None, error) => Err(RpcError::message(
                    error.clone().unwrap_or_else(|| "transaction failed".to_string()),
                )),
            };
        }

        Ok(HandlerOutcome::Result(to_value(&pending)?))
    }
}
