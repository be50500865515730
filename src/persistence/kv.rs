use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying file system or device failed
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The backend refused or could not complete the call
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// String key-value facility the store persists through.
///
/// Keys are plain identifiers chosen by the caller (the store uses
/// [`ENTRIES_KEY`](crate::store::ENTRIES_KEY) and
/// [`CONTEXT_KEY`](crate::store::CONTEXT_KEY)). A `set` replaces the stored
/// value for the key wholesale; `get` on a key that was never written
/// resolves to `None` rather than an error.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}
