use shared_types::{ActionId, ActionStatus, RpcError, StorageError};
use thiserror::Error;

pub type ActionResult<T> = Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("no action found for id {0}")]
    NotFound(ActionId),

    #[error("action {0} has already been resolved")]
    AlreadyResolved(ActionId),

    #[error("`{0}` is not a valid action update")]
    InvalidStatus(ActionStatus),

    #[error("approval window error: {0}")]
    Window(String),

    #[error("action settlement aborted: {0}")]
    Settlement(String),

    #[error("handler callbacks are already attached")]
    CallbacksAlreadyAttached,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ActionError> for RpcError {
    fn from(error: ActionError) -> Self {
        match error {
            ActionError::NotFound(_)
            | ActionError::AlreadyResolved(_)
            | ActionError::InvalidStatus(_) => RpcError::invalid_request(error.to_string()),
            _ => RpcError::internal(error.to_string()),
        }
    }
}
