//! Backoff for aggregator calls.

use crate::error::SwapResult;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting. Tests only need the attempt count.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. The delay doubles after every retryable failure.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> SwapResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SwapResult<T>>,
    {
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    debug!(attempt = attempt, delay_ms = delay.as_millis() as u64, "Retrying after {e}");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
