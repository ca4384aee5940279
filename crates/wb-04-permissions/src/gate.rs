use crate::ports::ActiveAccountProvider;
use crate::service::PermissionsService;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use wb_02_dispatch::PermissionGate;

/// Permission gate backed by the permission store.
pub struct PermissionsGate {
    permissions: Arc<PermissionsService>,
    accounts: Arc<dyn ActiveAccountProvider>,
}

impl PermissionsGate {
    pub fn new(permissions: Arc<PermissionsService>, accounts: Arc<dyn ActiveAccountProvider>) -> Self {
        Self {
            permissions,
            accounts,
        }
    }
}

#[async_trait]
impl PermissionGate for PermissionsGate {
    async fn is_domain_connected(&self, domain: &str) -> bool {
        let Some(address) = self.accounts.active_address().await else {
            return false;
        };
        match self
            .permissions
            .has_domain_permission_for_account(domain, &address)
            .await
        {
            Ok(granted) => granted,
            Err(e) => {
                warn!(domain = domain, error = %e, "Permission lookup failed, treating as not connected");
                false
            }
        }
    }
}
