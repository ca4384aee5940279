use shared_types::{RpcError, StorageError};
use thiserror::Error;

pub type PermissionsResult<T> = Result<T, PermissionsError>;

#[derive(Debug, Error)]
pub enum PermissionsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<PermissionsError> for RpcError {
    fn from(error: PermissionsError) -> Self {
        RpcError::stringified(error)
    }
}
