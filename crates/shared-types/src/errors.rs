//! Error types shared across services.

use thiserror::Error;

/// Failures of the key/value storage port.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not read or write.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A stored value did not match the expected shape.
    #[error("failed to decode `{key}`: {reason}")]
    Decode { key: String, reason: String },

    /// A value could not be turned into JSON.
    #[error("failed to encode `{key}`: {reason}")]
    Encode { key: String, reason: String },
}
