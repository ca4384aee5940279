//! # JSON File Storage Adapter
//!
//! [`KeyValueStore`] backed by a single JSON object on disk.
//!
//! - The document is read once, on first access, and kept in memory
//! - Every write rewrites the whole document through a sibling temp file and
//!   a rename, so a crash leaves either the old or the new document
//! - Writes are serialized; a failed write leaves the in-memory copy unchanged

use async_trait::async_trait;
use serde_json::{Map, Value};
use shared_types::{KeyValueStore, StorageError};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

type Document = Map<String, Value>;

pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<Option<Document>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Document, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No data file yet, starting empty");
                return Ok(Document::new());
            }
            Err(e) => return Err(backend(&self.path, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Document::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => Err(StorageError::Backend(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(backend(&self.path, e)),
        }
    }

    async fn write_document(&self, document: &Document) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| backend(parent, e))?;
        }
        let encoded = serde_json::to_vec_pretty(document).map_err(|e| backend(&self.path, e))?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, encoded)
            .await
            .map_err(|e| backend(&temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| backend(&self.path, e))?;
        debug!(path = %self.path.display(), keys = document.len(), "Data file written");
        Ok(())
    }

    /// Apply `change` to a copy, persist it, then publish it in memory.
    async fn modify<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Document),
    {
        let mut guard = self.document.lock().await;
        let mut next = match guard.as_ref() {
            Some(document) => document.clone(),
            None => self.read_document().await?,
        };
        change(&mut next);
        self.write_document(&next).await?;
        *guard = Some(next);
        Ok(())
    }
}

fn backend(path: &Path, error: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(format!("{}: {error}", path.display()))
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut guard = self.document.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_document().await?);
        }
        Ok(guard.as_ref().and_then(|document| document.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.modify(|document| {
            document.insert(key.to_string(), value);
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|document| {
            document.remove(key);
        })
        .await
    }
}
