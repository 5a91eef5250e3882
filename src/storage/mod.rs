//! Durable key-value storage for store snapshots.
//!
//! Keys are store names (e.g. `countStore`), values are JSON strings.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key '{key}': {reason}")]
    InvalidKey { key: String, reason: &'static str },

    #[error("Storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// String key-value storage.
pub trait Storage: Send + Sync {
    /// Read the value under `key`. Absent keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys double as file names, so keep them to a portable alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "key is empty",
        });
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        || key.starts_with('.')
    {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
            reason: "only ASCII letters, digits, '-', '_' and inner '.' are allowed",
        });
    }
    Ok(())
}
