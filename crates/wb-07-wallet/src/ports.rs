use crate::domain::message::MessageType;
use crate::domain::tx::{CustomTx, WalletType};
use crate::error::WalletResult;
use async_trait::async_trait;
use shared_types::Action;

/// Signer and broadcaster for the active wallet.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// `None` while no wallet is loaded.
    async fn wallet_type(&self) -> Option<WalletType>;

    /// C-chain address of the active account.
    async fn c_address(&self) -> Option<String>;

    /// Sign the message carried by an approved action. Returns the signature.
    async fn sign_message(&self, kind: MessageType, action: &Action) -> WalletResult<String>;

    /// Sign and broadcast a contract call. Returns the transaction hash.
    async fn send_custom_tx(&self, tx: CustomTx) -> WalletResult<String>;
}
