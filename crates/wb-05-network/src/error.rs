use shared_types::{RpcError, StorageError};
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("selected network not supported")]
    Unsupported(u64),

    #[error("rpc probe failed: {0}")]
    Probe(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<NetworkError> for RpcError {
    fn from(error: NetworkError) -> Self {
        RpcError::stringified(error)
    }
}
