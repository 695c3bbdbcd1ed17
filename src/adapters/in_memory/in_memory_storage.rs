// In memory implementation of the KeyValueStorage port.
//
// Purpose
// - Support store tests and local development without a browser or a disk.
//
// Responsibilities
// - Keep key to value pairs in a map.
// - Simulate an unavailable medium through the offline switch.

use crate::core::ports::{KeyValueStorage, StorageError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    is_offline: AtomicBool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // &self so tests can flip it behind an Arc<dyn KeyValueStorage>.
    pub fn set_offline(&self, offline: bool) {
        self.is_offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StorageError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("storage offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStorage for InMemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_online()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_online()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
