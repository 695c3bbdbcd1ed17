// Ports define what the core needs from the outside world, without implementing it.
//
// Purpose
// - Describe the storage medium as a trait (a synchronous key to string mapping).
//
// Responsibilities
// - Keep the core independent of any concrete medium (browser local storage,
//   a file, a test map) by coding against the trait.
//
// Boundaries
// - No concrete input or output here. Adapters implement this trait in the adapters layer.
//
// Testing guidance
// - Provide an in memory implementation for tests and local development.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
