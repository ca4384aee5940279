use async_trait::async_trait;

/// Source of the currently active account address.
#[async_trait]
pub trait ActiveAccountProvider: Send + Sync {
    async fn active_address(&self) -> Option<String>;
}
