use thiserror::Error;

pub type TransactionResult<T> = Result<T, TransactionError>;

#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("transaction not found: {0}")]
    NotFound(String),

    #[error("transaction {0} is already finalized")]
    Finalized(String),

    #[error("transaction {0} has no recipient")]
    MissingRecipient(String),
}
