use thiserror::Error;

pub type SwapResult<T> = Result<T, SwapError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// The aggregator is rate limiting; the build may be retried.
    #[error("Server too busy")]
    ServerTooBusy,

    #[error("{0}")]
    Upstream(String),

    #[error("invalid amount {0}")]
    InvalidAmount(String),
}

impl SwapError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerTooBusy)
    }
}
