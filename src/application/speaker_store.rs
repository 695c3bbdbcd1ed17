// Speaker store orchestrates the snapshot, the broadcaster, and the persistence bridge.
//
// Responsibilities
// - Hold the canonical in-memory snapshot, the sole source of truth for reads.
// - Compute a successor snapshot per mutation, then broadcast it, then persist it.
// - Replay the current snapshot to every new subscriber.
//
// Boundaries
// - One logical mutator at a time. Concurrent callers must be serialized
//   before reaching the store.
// - A persistence failure is surfaced to the mutating caller, but the
//   in-memory snapshot and the broadcast have already advanced and are not
//   rolled back: callers can detect the durability gap from the error.

use crate::application::broadcaster::{Broadcaster, Subscription};
use crate::application::errors::StoreError;
use crate::application::persistence::SpeakerPersistence;
use crate::core::speaker::{Snapshot, Speaker, SpeakerFields};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub struct SpeakerStore {
    snapshot: RwLock<Snapshot>,
    broadcaster: Broadcaster<Snapshot>,
    persistence: SpeakerPersistence,
}

impl SpeakerStore {
    /// Builds a store seeded from the persisted snapshot. A corrupt persisted
    /// value fails construction; an absent one seeds the empty snapshot.
    pub async fn load(persistence: SpeakerPersistence) -> Result<Self, StoreError> {
        let snapshot = persistence.load().await?;
        info!(count = snapshot.len(), "speaker store seeded");
        Ok(Self {
            broadcaster: Broadcaster::new(snapshot.clone()),
            snapshot: RwLock::new(snapshot),
            persistence,
        })
    }

    /// The current snapshot, in insertion order.
    pub async fn list(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    /// The speakers belonging to `event_id`, relative order preserved.
    pub async fn list_by_event(&self, event_id: &str) -> Vec<Speaker> {
        self.snapshot
            .read()
            .await
            .iter()
            .filter(|speaker| speaker.event_id == event_id)
            .cloned()
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Speaker> {
        self.snapshot
            .read()
            .await
            .iter()
            .find(|speaker| speaker.id == id)
            .cloned()
    }

    /// Appends a new speaker with a fresh id and returns it.
    pub async fn add(&self, event_id: &str, fields: SpeakerFields) -> Result<Speaker, StoreError> {
        let speaker = Speaker::new(generate_id(), event_id.to_string(), fields);
        let next: Snapshot = {
            let current = self.snapshot.read().await;
            current
                .iter()
                .cloned()
                .chain(std::iter::once(speaker.clone()))
                .collect()
        };
        debug!(id = %speaker.id, event_id = %speaker.event_id, "speaker added");
        self.commit(next).await?;
        Ok(speaker)
    }

    /// Shallow-merges `patch` into the matching speaker's opaque fields, in
    /// place. Identity fields never change. A missing id is a silent no-op.
    pub async fn update(&self, id: &str, patch: &SpeakerFields) -> Result<(), StoreError> {
        let next: Snapshot = {
            let current = self.snapshot.read().await;
            if !current.iter().any(|speaker| speaker.id == id) {
                debug!(id, "update target not found, no-op");
                return Ok(());
            }
            current
                .iter()
                .map(|speaker| {
                    if speaker.id == id {
                        speaker.merged(patch)
                    } else {
                        speaker.clone()
                    }
                })
                .collect()
        };
        debug!(id, "speaker updated");
        self.commit(next).await
    }

    /// Removes the matching speaker. A missing id is a silent no-op and skips
    /// the persisted write, since the snapshot is unchanged.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let next: Snapshot = {
            let current = self.snapshot.read().await;
            if !current.iter().any(|speaker| speaker.id == id) {
                debug!(id, "delete target not found, no-op");
                return Ok(());
            }
            current
                .iter()
                .filter(|speaker| speaker.id != id)
                .cloned()
                .collect()
        };
        debug!(id, "speaker deleted");
        self.commit(next).await
    }

    /// Registers an observer; the current snapshot is delivered to it before
    /// this returns, and every later mutation's snapshot after that.
    pub fn subscribe(
        &self,
        observer: impl FnMut(Snapshot) + Send + 'static,
    ) -> Subscription<Snapshot> {
        self.broadcaster.subscribe(observer)
    }

    // Mutation tail: swap the snapshot, broadcast, persist. In that order, so
    // subscribers see the new state even when the write fails afterwards.
    async fn commit(&self, next: Snapshot) -> Result<(), StoreError> {
        *self.snapshot.write().await = next.clone();
        self.broadcaster.publish(next.clone());
        self.persistence.save(&next).await?;
        Ok(())
    }
}

fn generate_id() -> String {
    // UUIDv7 is timestamp plus randomness, unique for any call sequence.
    format!("speaker_{}", Uuid::now_v7().simple())
}
