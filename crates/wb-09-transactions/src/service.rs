//! Transaction tracker.

use crate::domain::{Transaction, TxParams, TxStatus, TxUpdate};
use crate::error::{TransactionError, TransactionResult};
use parking_lot::RwLock;
use serde_json::Value;
use shared_bus::{EventPublisher, WalletEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;
use wb_07_wallet::{CustomTx, WalletService};

type TxMap = HashMap<String, Transaction>;

pub struct TransactionsService {
    wallet: Arc<dyn WalletService>,
    events: Arc<dyn EventPublisher>,
    pending: RwLock<TxMap>,
    /// Finalized transactions; waiters watch this map.
    finished: watch::Sender<TxMap>,
}

impl TransactionsService {
    pub fn new(wallet: Arc<dyn WalletService>, events: Arc<dyn EventPublisher>) -> Self {
        let (finished, _) = watch::channel(HashMap::new());
        Self {
            wallet,
            events,
            pending: RwLock::new(HashMap::new()),
            finished,
        }
    }

    /// Track a new transaction awaiting confirmation.
    pub async fn add_transaction(&self, tx_params: TxParams, display_values: Value) -> Transaction {
        let tx = Transaction {
            id: Uuid::new_v4().to_string(),
            status: TxStatus::Pending,
            tx_params,
            tx_hash: None,
            error: None,
            display_values,
        };
        self.pending.write().insert(tx.id.clone(), tx.clone());
        info!(tx_id = %tx.id, "Transaction added");
        self.publish(&tx).await;
        tx
    }

    pub fn pending_transaction(&self, id: &str) -> Option<Transaction> {
        self.pending.read().get(id).cloned()
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.pending.read().values().cloned().collect()
    }

    pub fn finished_transaction(&self, id: &str) -> Option<Transaction> {
        self.finished.borrow().get(id).cloned()
    }

    /// Apply an update. Returns the pending transaction after the update, if
    /// it is still pending.
    pub async fn apply(&self, update: TxUpdate) -> TransactionResult<Option<Transaction>> {
        match update {
            TxUpdate::Status { id, status } => self.set_status(&id, status).await,
            TxUpdate::Params { id, params } => {
                let tx = self.modify(&id, |tx| {
                    if let Some(gas_price) = params.gas_price {
                        tx.tx_params.gas_price = Some(gas_price);
                    }
                    if let Some(gas_limit) = params.gas_limit {
                        tx.tx_params.gas = Some(gas_limit);
                    }
                })?;
                debug!(tx_id = %id, "Transaction params updated");
                Ok(Some(tx))
            }
            TxUpdate::Finalized { id, tx_hash, error } => {
                self.finalize(&id, tx_hash, error).await?;
                Ok(None)
            }
        }
    }

    /// Wait until `id` is finalized.
    pub async fn wait_finalized(&self, id: &str) -> Option<Transaction> {
        let mut rx = self.finished.subscribe();
        let finished = rx.wait_for(|txs| txs.contains_key(id)).await.ok()?;
        finished.get(id).cloned()
    }

    async fn set_status(
        &self,
        id: &str,
        status: TxStatus,
    ) -> TransactionResult<Option<Transaction>> {
        if status.is_final() {
            let error = (status != TxStatus::Signed).then(|| status.as_str().to_string());
            self.finalize(id, None, error).await?;
            return Ok(None);
        }

        let mut first_submit = false;
        let tx = self.modify(id, |tx| {
            first_submit = status == TxStatus::Submitting && tx.status != TxStatus::Submitting;
            tx.status = status;
        })?;
        self.publish(&tx).await;

        if first_submit {
            self.submit(tx.clone()).await;
        }
        Ok(self.pending_transaction(id).or(Some(tx)))
    }

    /// Hand the transaction to the wallet; the outcome finalizes it.
    async fn submit(&self, tx: Transaction) {
        let id = tx.id.clone();
        let outcome = match tx_to_custom(&tx) {
            Ok(custom) => self.wallet.send_custom_tx(custom).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        let (tx_hash, error) = match outcome {
            Ok(hash) => (Some(hash), None),
            Err(e) => {
                warn!(tx_id = %id, error = %e, "Transaction submission failed");
                (None, Some(e))
            }
        };
        if let Err(e) = self.finalize(&id, tx_hash, error).await {
            debug!(tx_id = %id, error = %e, "Transaction finalized elsewhere");
        }
    }

    async fn finalize(
        &self,
        id: &str,
        tx_hash: Option<String>,
        error: Option<String>,
    ) -> TransactionResult<()> {
        let mut tx = self.pending.write().remove(id).ok_or_else(|| {
            if self.finished.borrow().contains_key(id) {
                TransactionError::Finalized(id.to_string())
            } else {
                TransactionError::NotFound(id.to_string())
            }
        })?;
        tx.status = if tx_hash.is_some() {
            TxStatus::Signed
        } else {
            TxStatus::Error
        };
        tx.tx_hash = tx_hash;
        tx.error = error;
        info!(tx_id = %id, status = tx.status.as_str(), tx_hash = ?tx.tx_hash, "Transaction finalized");

        self.finished.send_modify(|txs| {
            txs.insert(id.to_string(), tx.clone());
        });
        self.publish(&tx).await;
        Ok(())
    }

    fn modify<F>(&self, id: &str, f: F) -> TransactionResult<Transaction>
    where
        F: FnOnce(&mut Transaction),
    {
        let mut pending = self.pending.write();
        let tx = pending
            .get_mut(id)
            .ok_or_else(|| TransactionError::NotFound(id.to_string()))?;
        f(tx);
        Ok(tx.clone())
    }

    async fn publish(&self, tx: &Transaction) {
        self.events
            .publish(WalletEvent::TransactionUpdated {
                id: tx.id.clone(),
                status: tx.status.as_str().to_string(),
                tx_hash: tx.tx_hash.clone(),
            })
            .await;
    }
}

fn tx_to_custom(tx: &Transaction) -> TransactionResult<CustomTx> {
    let to = tx
        .tx_params
        .to
        .clone()
        .ok_or_else(|| TransactionError::MissingRecipient(tx.id.clone()))?;
    Ok(CustomTx {
        to,
        gas_price: tx.tx_params.gas_price.unwrap_or_default(),
        gas_limit: tx.tx_params.gas.unwrap_or_default(),
        data: tx.tx_params.data.clone(),
        value: tx.tx_params.value,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use primitive_types::U256;
    use shared_bus::InMemoryEventBus;
    use shared_types::Action;
    use std::sync::Mutex;
    use std::time::Duration;
    use wb_07_wallet::{MessageType, WalletError, WalletResult, WalletType};

    /// Broadcasts succeed unless `fail` is set.
    #[derive(Default)]
    pub(crate) struct MockWallet {
        pub(crate) fail: bool,
        pub(crate) sent: Mutex<Vec<CustomTx>>,
    }

    #[async_trait]
    impl WalletService for MockWallet {
        async fn wallet_type(&self) -> Option<WalletType> {
            Some(WalletType::Mnemonic)
        }

        async fn c_address(&self) -> Option<String> {
            Some("0xabc".into())
        }

        async fn sign_message(&self, _: MessageType, _: &Action) -> WalletResult<String> {
            unimplemented!("not used by transactions")
        }

        async fn send_custom_tx(&self, tx: CustomTx) -> WalletResult<String> {
            if self.fail {
                return Err(WalletError::Broadcast("nonce too low".into()));
            }
            self.sent.lock().unwrap().push(tx);
            Ok("0xhash".into())
        }
    }

    pub(crate) fn service_with(wallet: MockWallet) -> TransactionsService {
        TransactionsService::new(Arc::new(wallet), Arc::new(InMemoryEventBus::new()))
    }

    pub(crate) fn transfer() -> TxParams {
        TxParams {
            from: "0xabc".into(),
            to: Some("0xdef".into()),
            value: Some(U256::from(5u64)),
            gas: Some(21_000),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submit_finalizes_with_hash() {
        let service = service_with(MockWallet::default());
        let tx = service.add_transaction(transfer(), Value::Null).await;

        service
            .apply(TxUpdate::Status {
                id: tx.id.clone(),
                status: TxStatus::Submitting,
            })
            .await
            .unwrap();

        let done = service.wait_finalized(&tx.id).await.unwrap();
        assert_eq!(done.status, TxStatus::Signed);
        assert_eq!(done.tx_hash.as_deref(), Some("0xhash"));
        assert!(service.pending_transaction(&tx.id).is_none());
    }

    #[tokio::test]
    async fn test_failed_broadcast_finalizes_with_error() {
        let service = service_with(MockWallet {
            fail: true,
            ..Default::default()
        });
        let tx = service.add_transaction(transfer(), Value::Null).await;
        service
            .apply(TxUpdate::Status {
                id: tx.id.clone(),
                status: TxStatus::Submitting,
            })
            .await
            .unwrap();

        let done = service.finished_transaction(&tx.id).unwrap();
        assert_eq!(done.status, TxStatus::Error);
        assert_eq!(done.error.as_deref(), Some("nonce too low"));
    }

    #[tokio::test]
    async fn test_params_patch() {
        let service = service_with(MockWallet::default());
        let tx = service.add_transaction(transfer(), Value::Null).await;
        let updated = service
            .apply(TxUpdate::Params {
                id: tx.id.clone(),
                params: crate::domain::TxParamsPatch {
                    gas_price: Some(U256::from(7u64)),
                    gas_limit: None,
                },
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.tx_params.gas_price, Some(U256::from(7u64)));
        assert_eq!(updated.tx_params.gas, Some(21_000));
    }

    #[tokio::test]
    async fn test_waiter_wakes_on_external_finalize() {
        let service = Arc::new(service_with(MockWallet::default()));
        let tx = service.add_transaction(transfer(), Value::Null).await;

        let waiter = {
            let service = service.clone();
            let id = tx.id.clone();
            tokio::spawn(async move { service.wait_finalized(&id).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        service
            .apply(TxUpdate::Finalized {
                id: tx.id.clone(),
                tx_hash: None,
                error: Some("rejected by node".into()),
            })
            .await
            .unwrap();

        let done = waiter.await.unwrap().unwrap();
        assert_eq!(done.error.as_deref(), Some("rejected by node"));

        let again = service
            .apply(TxUpdate::Finalized {
                id: tx.id.clone(),
                tx_hash: Some("0x1".into()),
                error: None,
            })
            .await;
        assert!(matches!(again, Err(TransactionError::Finalized(_))));
    }
}
