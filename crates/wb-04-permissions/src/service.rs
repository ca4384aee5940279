//! Permission store.

use crate::error::PermissionsResult;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_bus::{EventPublisher, WalletEvent};
use shared_types::{keys, DappPermissions, Permissions, StorageService};
use std::sync::Arc;
use tracing::{debug, info};

/// Name and icon a page announced for itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

pub struct PermissionsService {
    storage: StorageService,
    events: Arc<dyn EventPublisher>,
    cache: RwLock<Option<Permissions>>,
    write_gate: tokio::sync::Mutex<()>,
    site_metadata: DashMap<String, SiteMetadata>,
}

impl PermissionsService {
    pub fn new(storage: StorageService, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            storage,
            events,
            cache: RwLock::new(None),
            write_gate: tokio::sync::Mutex::new(()),
            site_metadata: DashMap::new(),
        }
    }

    pub async fn get_permissions(&self) -> PermissionsResult<Permissions> {
        if let Some(cached) = self.cache.read().as_ref() {
            return Ok(cached.clone());
        }
        let stored: Permissions = self
            .storage
            .load(keys::PERMISSIONS)
            .await?
            .unwrap_or_default();
        debug!(domains = stored.len(), "Loaded permissions");
        let mut cache = self.cache.write();
        Ok(cache.get_or_insert(stored).clone())
    }

    pub async fn get_permissions_for_domain(
        &self,
        domain: &str,
    ) -> PermissionsResult<Option<DappPermissions>> {
        Ok(self.get_permissions().await?.get(domain).cloned())
    }

    pub async fn has_domain_permission_for_account(
        &self,
        domain: &str,
        address: &str,
    ) -> PermissionsResult<bool> {
        Ok(self
            .get_permissions_for_domain(domain)
            .await?
            .is_some_and(|record| record.is_granted(address)))
    }

    /// Replace the record for `record.domain`.
    pub async fn add_permission(&self, record: DappPermissions) -> PermissionsResult<()> {
        let domain = record.domain.clone();
        self.update(|permissions| {
            permissions.insert(domain, record);
        })
        .await
    }

    /// Grant `address` to `domain`, keeping earlier grants.
    pub async fn grant(&self, domain: &str, address: &str) -> PermissionsResult<()> {
        self.update(|permissions| {
            permissions
                .entry(domain.to_string())
                .or_insert_with(|| DappPermissions::new(domain))
                .accounts
                .insert(address.to_string(), true);
        })
        .await?;
        info!(domain = domain, address = address, "Domain granted account access");
        Ok(())
    }

    /// Withdraw one account; the record goes away with its last grant.
    pub async fn revoke_account(&self, domain: &str, address: &str) -> PermissionsResult<()> {
        self.update(|permissions| {
            let now_empty = permissions.get_mut(domain).is_some_and(|record| {
                record.accounts.insert(address.to_string(), false);
                !record.has_any_grant()
            });
            if now_empty {
                permissions.remove(domain);
            }
        })
        .await
    }

    /// Remove every grant of `domain`. Returns `false` if it had none.
    pub async fn revoke_domain(&self, domain: &str) -> PermissionsResult<bool> {
        if self.get_permissions_for_domain(domain).await?.is_none() {
            return Ok(false);
        }
        self.update(|permissions| {
            permissions.remove(domain);
        })
        .await?;
        info!(domain = domain, "Domain access revoked");
        Ok(true)
    }

    pub fn set_site_metadata(&self, domain: &str, metadata: SiteMetadata) {
        self.site_metadata.insert(domain.to_string(), metadata);
    }

    pub fn site_metadata(&self, domain: &str) -> Option<SiteMetadata> {
        self.site_metadata.get(domain).map(|entry| entry.value().clone())
    }

    async fn update<F>(&self, f: F) -> PermissionsResult<()>
    where
        F: FnOnce(&mut Permissions) + Send,
    {
        let _gate = self.write_gate.lock().await;
        let mut permissions = self.get_permissions().await?;
        f(&mut permissions);
        self.storage.save(keys::PERMISSIONS, &permissions).await?;
        *self.cache.write() = Some(permissions.clone());
        self.events
            .publish(WalletEvent::PermissionsUpdated(permissions))
            .await;
        Ok(())
    }
}
