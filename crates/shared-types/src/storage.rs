//! Storage port.
//!
//! Services never touch a backend directly: they go through
//! [`StorageService`], which encodes and decodes typed values over any
//! [`KeyValueStore`].

use crate::errors::StorageError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::error;

/// Storage keys owned by the background services.
pub mod keys {
    pub const PERMISSIONS: &str = "permissions";
    pub const NETWORK: &str = "network";
    pub const CUSTOM_NETWORKS: &str = "custom_networks";
    pub const NETWORK_OVERRIDES: &str = "network_overrides";
    pub const ACCOUNTS: &str = "accounts";
    pub const PENDING_ACTIONS: &str = "pending_actions";
}

/// Raw key/value backend.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed access to a [`KeyValueStore`].
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|e| {
                error!(key = key, error = %e, "Stored value has unexpected shape");
                StorageError::Decode {
                    key: key.to_string(),
                    reason: e.to_string(),
                }
            })
    }

    pub async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_value(value).map_err(|e| StorageError::Encode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.set(key, encoded).await.inspect_err(|e| {
            error!(key = key, error = %e, "Failed to persist value");
        })
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key).await
    }
}

/// Process-memory backend.
#[derive(Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value, without going through the async port.
    pub fn snapshot(&self, key: &str) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DappPermissions, Permissions};
    use serde_json::json;

    #[tokio::test]
    async fn test_typed_round_trip() {
        let storage = StorageService::new(Arc::new(InMemoryStore::new()));
        let mut permissions = Permissions::new();
        permissions.insert("app.example".into(), DappPermissions::new("app.example"));

        storage.save(keys::PERMISSIONS, &permissions).await.unwrap();
        let loaded: Option<Permissions> = storage.load(keys::PERMISSIONS).await.unwrap();
        assert_eq!(loaded, Some(permissions));

        storage.remove(keys::PERMISSIONS).await.unwrap();
        let gone: Option<Permissions> = storage.load(keys::PERMISSIONS).await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_decode_error_names_key() {
        let store = Arc::new(InMemoryStore::new());
        store.set(keys::NETWORK, json!("not a number")).await.unwrap();
        let storage = StorageService::new(store);

        let result: Result<Option<u64>, _> = storage.load(keys::NETWORK).await;
        match result {
            Err(StorageError::Decode { key, .. }) => assert_eq!(key, keys::NETWORK),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
