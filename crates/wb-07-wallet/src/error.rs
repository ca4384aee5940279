use shared_types::RpcError;
use thiserror::Error;

pub type WalletResult<T> = Result<T, WalletError>;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet undefined")]
    Undefined,

    #[error("{0}")]
    InvalidMessage(String),

    #[error("{0}")]
    Signer(String),

    #[error("{0}")]
    Broadcast(String),
}

impl From<WalletError> for RpcError {
    fn from(error: WalletError) -> Self {
        match error {
            WalletError::Undefined => RpcError::message(error.to_string()),
            WalletError::InvalidMessage(message) => RpcError::invalid_params(message),
            other => RpcError::stringified(other),
        }
    }
}
