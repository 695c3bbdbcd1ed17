use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use speaker_store::adapters::in_memory::in_memory_storage::InMemoryStorage;
use speaker_store::application::persistence::SpeakerPersistence;
use speaker_store::application::speaker_store::SpeakerStore;
use speaker_store::core::speaker::SpeakerFields;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    // In-memory deps for now
    let storage = Arc::new(InMemoryStorage::new());
    let store = SpeakerStore::load(SpeakerPersistence::new(storage.clone())).await?;

    let _subscription = store.subscribe(|snapshot| {
        tracing::info!(count = snapshot.len(), "speakers changed");
    });

    let fields: SpeakerFields = [
        ("first_name".to_string(), json!("Ada")),
        ("last_name".to_string(), json!("Lovelace")),
        ("company".to_string(), json!("Analytical Engines")),
    ]
    .into_iter()
    .collect();
    let speaker = store.add("event-demo", fields).await?;

    let patch: SpeakerFields = [("company".to_string(), json!("Difference Engines"))]
        .into_iter()
        .collect();
    store.update(&speaker.id, &patch).await?;

    for speaker in store.list_by_event("event-demo").await {
        tracing::info!(id = %speaker.id, "speaker for event-demo");
    }

    store.delete(&speaker.id).await?;

    Ok(())
}
