use super::kv::{KeyValueStorage, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Process-local storage backend. Nothing survives a restart; meant for
/// tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    cells: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.cells.lock().map(|cells| cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cells = self
            .cells
            .lock()
            .map_err(|_| StorageError::Backend("storage mutex poisoned".into()))?;
        Ok(cells.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut cells = self
            .cells
            .lock()
            .map_err(|_| StorageError::Backend("storage mutex poisoned".into()))?;
        cells.insert(key.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("entries").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let storage = MemoryStorage::new();
        storage.set("entries", "{}".to_string()).await.unwrap();
        assert_eq!(storage.get("entries").await.unwrap(), Some("{}".to_string()));
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_value() {
        let storage = MemoryStorage::new();
        storage.set("context", "\"active\"".to_string()).await.unwrap();
        storage.set("context", "\"deferred\"".to_string()).await.unwrap();
        assert_eq!(
            storage.get("context").await.unwrap(),
            Some("\"deferred\"".to_string())
        );
        assert_eq!(storage.len(), 1);
    }
}
