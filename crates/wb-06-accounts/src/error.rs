use shared_types::{RpcError, StorageError};
use thiserror::Error;

pub type AccountsResult<T> = Result<T, AccountsError>;

#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("account already exists: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<AccountsError> for RpcError {
    fn from(error: AccountsError) -> Self {
        RpcError::stringified(error)
    }
}
