// Persistence bridge: the sole translator between a snapshot and the storage medium.
//
// Purpose
// - Serialize the full snapshot under one fixed key after every mutation.
// - Deserialize it once, at store construction, to seed the snapshot.
//
// Responsibilities
// - Treat an absent key as the empty snapshot, never as an error.
// - Surface an undecodable stored value as an explicit error instead of
//   starting over from a fabricated empty snapshot.
//
// Boundaries
// - Every write replaces the whole document. Fine at this collection size;
//   an incremental format would change the observable persisted form.

use crate::core::ports::{KeyValueStorage, StorageError};
use crate::core::speaker::{empty_snapshot, Snapshot, Speaker};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// The one key this bridge owns in the storage medium.
pub const STORAGE_KEY: &str = "eventtan_speakers";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("corrupt persisted snapshot under '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub struct SpeakerPersistence {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
}

impl SpeakerPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage,
            key: STORAGE_KEY.to_string(),
        }
    }

    pub async fn load(&self) -> Result<Snapshot, PersistenceError> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            debug!(key = %self.key, "no persisted snapshot, seeding empty");
            return Ok(empty_snapshot());
        };
        let speakers: Vec<Speaker> =
            serde_json::from_str(&raw).map_err(|source| PersistenceError::Corrupt {
                key: self.key.clone(),
                source,
            })?;
        debug!(key = %self.key, count = speakers.len(), "loaded persisted snapshot");
        Ok(speakers.into())
    }

    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let encoded = serde_json::to_string(&**snapshot).map_err(PersistenceError::Encode)?;
        self.storage.set(&self.key, &encoded).await?;
        debug!(key = %self.key, count = snapshot.len(), "persisted snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod speaker_persistence_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_storage::InMemoryStorage;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn before_each() -> (Arc<InMemoryStorage>, SpeakerPersistence) {
        let storage = Arc::new(InMemoryStorage::new());
        let persistence = SpeakerPersistence::new(storage.clone());
        (storage, persistence)
    }

    fn sample_snapshot() -> Snapshot {
        vec![Speaker::new(
            "speaker-fixed-0001".to_string(),
            "event-fixed-0001".to_string(),
            [("first_name".to_string(), json!("Ada"))].into_iter().collect(),
        )]
        .into()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_load_an_empty_snapshot_when_nothing_is_persisted(
        before_each: (Arc<InMemoryStorage>, SpeakerPersistence),
    ) {
        let (_, persistence) = before_each;
        let snapshot = persistence.load().await.unwrap();
        assert!(snapshot.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_round_trip_a_snapshot(
        before_each: (Arc<InMemoryStorage>, SpeakerPersistence),
    ) {
        let (_, persistence) = before_each;
        let snapshot = sample_snapshot();
        persistence.save(&snapshot).await.unwrap();
        let loaded = persistence.load().await.unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_fail_to_load_a_corrupt_snapshot(
        before_each: (Arc<InMemoryStorage>, SpeakerPersistence),
    ) {
        let (storage, persistence) = before_each;
        storage.set(STORAGE_KEY, "not json at all").await.unwrap();
        let result = persistence.load().await;
        assert!(matches!(result, Err(PersistenceError::Corrupt { .. })));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_surface_a_storage_failure_on_save(
        before_each: (Arc<InMemoryStorage>, SpeakerPersistence),
    ) {
        let (storage, persistence) = before_each;
        storage.set_offline(true);
        let result = persistence.save(&sample_snapshot()).await;
        assert!(matches!(result, Err(PersistenceError::Storage(_))));
    }
}
