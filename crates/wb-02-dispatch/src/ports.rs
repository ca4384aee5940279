//! Ports consumed by the pipeline.

use async_trait::async_trait;

/// Decides whether a dApp domain is connected to the wallet.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// `true` when the domain has a permission record granting the active account.
    async fn is_domain_connected(&self, domain: &str) -> bool;
}
