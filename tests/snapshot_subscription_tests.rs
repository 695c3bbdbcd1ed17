// Subscription behavior of the store, end to end over the in memory adapter.
//
// Responsibilities
// - Assert replay-latest: a late subscriber immediately receives the snapshot
//   reflecting every prior mutation.
// - Assert that each mutation reaches every active subscriber and that a
//   cancelled subscriber stops receiving without affecting the others.

use speaker_store::adapters::in_memory::in_memory_storage::InMemoryStorage;
use speaker_store::application::persistence::SpeakerPersistence;
use speaker_store::application::speaker_store::SpeakerStore;
use speaker_store::core::speaker::{Snapshot, SpeakerFields};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn fields(pairs: &[(&str, &str)]) -> SpeakerFields {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), json!(value)))
        .collect()
}

fn recording_observer(
    log: &Arc<Mutex<Vec<Snapshot>>>,
) -> impl FnMut(Snapshot) + Send + 'static {
    let log = log.clone();
    move |snapshot| {
        log.lock().unwrap().push(snapshot);
    }
}

async fn store_over(storage: &Arc<InMemoryStorage>) -> SpeakerStore {
    SpeakerStore::load(SpeakerPersistence::new(storage.clone()))
        .await
        .unwrap()
}

#[tokio::test]
async fn replays_the_latest_snapshot_to_a_late_subscriber() {
    let storage = Arc::new(InMemoryStorage::new());
    let store = store_over(&storage).await;

    store.add("evt1", fields(&[("name", "A")])).await.unwrap();
    store.add("evt1", fields(&[("name", "B")])).await.unwrap();
    let survivor = store.add("evt1", fields(&[("name", "C")])).await.unwrap();
    store.delete(&survivor.id).await.unwrap();

    let log = Arc::new(Mutex::new(Vec::new()));
    let _subscription = store.subscribe(recording_observer(&log));

    // Delivered before subscribe returned, no further mutation needed.
    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].len(), 2);
    assert_eq!(*deliveries[0], *store.list().await);
}

#[tokio::test]
async fn delivers_every_mutation_to_all_subscribers() {
    let storage = Arc::new(InMemoryStorage::new());
    let store = store_over(&storage).await;

    let first_log = Arc::new(Mutex::new(Vec::new()));
    let second_log = Arc::new(Mutex::new(Vec::new()));
    let _first = store.subscribe(recording_observer(&first_log));
    let _second = store.subscribe(recording_observer(&second_log));

    let speaker = store.add("evt1", fields(&[("name", "A")])).await.unwrap();
    store
        .update(&speaker.id, &fields(&[("name", "A2")]))
        .await
        .unwrap();
    store.delete(&speaker.id).await.unwrap();

    for log in [&first_log, &second_log] {
        let deliveries = log.lock().unwrap();
        // Initial replay plus one delivery per mutation.
        assert_eq!(deliveries.len(), 4);
        assert!(deliveries[0].is_empty());
        assert_eq!(deliveries[1].len(), 1);
        assert_eq!(
            deliveries[2][0].fields.get("name"),
            Some(&json!("A2"))
        );
        assert!(deliveries[3].is_empty());
    }
}

#[tokio::test]
async fn cancelling_one_subscription_does_not_affect_the_others() {
    let storage = Arc::new(InMemoryStorage::new());
    let store = store_over(&storage).await;

    let cancelled_log = Arc::new(Mutex::new(Vec::new()));
    let surviving_log = Arc::new(Mutex::new(Vec::new()));
    let cancelled = store.subscribe(recording_observer(&cancelled_log));
    let _surviving = store.subscribe(recording_observer(&surviving_log));

    store.add("evt1", fields(&[("name", "A")])).await.unwrap();
    cancelled.cancel();
    store.add("evt1", fields(&[("name", "B")])).await.unwrap();

    assert_eq!(cancelled_log.lock().unwrap().len(), 2);
    assert_eq!(surviving_log.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn does_not_notify_subscribers_for_no_op_mutations() {
    let storage = Arc::new(InMemoryStorage::new());
    let store = store_over(&storage).await;

    let log = Arc::new(Mutex::new(Vec::new()));
    let _subscription = store.subscribe(recording_observer(&log));

    store.update("missing", &fields(&[("name", "X")])).await.unwrap();
    store.delete("missing").await.unwrap();

    // Only the initial replay.
    assert_eq!(log.lock().unwrap().len(), 1);
}
