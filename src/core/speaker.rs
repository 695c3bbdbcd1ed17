// Speaker is the managed record; Snapshot is the full ordered collection of them.
//
// Purpose
// - Represent one speaker with stable identity fields and an opaque payload.
// - Define the snapshot value that the store, the broadcaster, and the
//   persistence bridge all exchange.
//
// Boundaries
// - This file must not perform input or output.
// - Keep it framework-free. The core never inspects the opaque fields;
//   callers own their meaning (name, contact info, flags, and so on).
//
// Notes
// - A snapshot is never mutated in place. Every mutation builds a new one,
//   so observers holding an earlier snapshot keep a consistent view.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Ordered, immutable collection of speakers. Cloning is cheap.
pub type Snapshot = Arc<[Speaker]>;

/// Opaque non-identity payload of a speaker.
pub type SpeakerFields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Store-assigned, unique, immutable for the speaker's lifetime.
    pub id: String,
    /// The owning event, supplied at creation, immutable afterwards.
    pub event_id: String,
    /// Everything else, preserved verbatim across merge and persist cycles.
    #[serde(flatten)]
    pub fields: SpeakerFields,
}

impl Speaker {
    /// Builds a speaker, discarding identity keys smuggled into `fields`.
    pub fn new(id: String, event_id: String, fields: SpeakerFields) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(key, _)| !is_identity_key(key))
            .collect();
        Self {
            id,
            event_id,
            fields,
        }
    }

    /// Shallow merge: supplied fields overwrite, omitted fields survive.
    /// Identity keys in the patch are ignored; `id` and `event_id` never change.
    pub fn merged(&self, patch: &SpeakerFields) -> Self {
        let mut fields = self.fields.clone();
        for (key, value) in patch {
            if is_identity_key(key) {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
        Self {
            id: self.id.clone(),
            event_id: self.event_id.clone(),
            fields,
        }
    }
}

fn is_identity_key(key: &str) -> bool {
    matches!(key, "id" | "event_id")
}

/// The empty snapshot. Absence of persisted state decodes to this.
pub fn empty_snapshot() -> Snapshot {
    Vec::new().into()
}
