//! Application entities and a schemaless record.
//!
//! Every entity embeds [`SyncMetadata`] flattened into its own JSON object,
//! so a `Word` on the wire looks like
//! `{"id": "...", "word": "...", "synced": false, "locallyUpdatedAt": "..."}`.
//! Deletion is a payload-level `removed` flag; the engine never drops records.

use crate::{RecordId, SyncMetadata, Syncable, Timestamp};
use serde::{Deserialize, Serialize};

macro_rules! impl_syncable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Syncable for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn sync_metadata(&self) -> &SyncMetadata {
                    &self.meta
                }

                fn sync_metadata_mut(&mut self) -> &mut SyncMetadata {
                    &mut self.meta
                }
            }
        )+
    };
}

impl_syncable!(Word, Session, Evaluation, Suggestion, JsonRecord);

/// A vocabulary word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: RecordId,
    /// The word in the language being learned
    pub word: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Soft delete flag
    #[serde(default)]
    pub removed: bool,
    #[serde(flatten)]
    pub meta: SyncMetadata,
}

impl Word {
    /// Create a word on this device, pending sync.
    pub fn new(
        id: impl Into<RecordId>,
        word: impl Into<String>,
        translation: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            translation: translation.into(),
            example: None,
            removed: false,
            meta: SyncMetadata::new_local(now),
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Change the translation as a local edit.
    pub fn retranslate(&mut self, translation: impl Into<String>, now: Timestamp) {
        self.translation = translation.into();
        self.touch(now);
    }

    /// Soft-delete as a local edit.
    pub fn remove(&mut self, now: Timestamp) {
        self.removed = true;
        self.touch(now);
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A study session over a set of words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: RecordId,
    pub started_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Words studied in this session, in presentation order
    #[serde(default)]
    pub word_ids: Vec<RecordId>,
    #[serde(default)]
    pub removed: bool,
    #[serde(flatten)]
    pub meta: SyncMetadata,
}

impl Session {
    pub fn new(id: impl Into<RecordId>, word_ids: Vec<RecordId>, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            started_at: now,
            finished_at: None,
            word_ids,
            removed: false,
            meta: SyncMetadata::new_local(now),
        }
    }

    /// Close the session as a local edit.
    pub fn finish(&mut self, now: Timestamp) {
        self.finished_at = Some(now);
        self.touch(now);
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn remove(&mut self, now: Timestamp) {
        self.removed = true;
        self.touch(now);
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// The outcome of quizzing one word during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: RecordId,
    pub word_id: RecordId,
    pub session_id: RecordId,
    pub correct: bool,
    pub evaluated_at: Timestamp,
    #[serde(flatten)]
    pub meta: SyncMetadata,
}

impl Evaluation {
    pub fn new(
        id: impl Into<RecordId>,
        word_id: impl Into<RecordId>,
        session_id: impl Into<RecordId>,
        correct: bool,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            word_id: word_id.into(),
            session_id: session_id.into(),
            correct,
            evaluated_at: now,
            meta: SyncMetadata::new_local(now),
        }
    }
}

/// A word proposed for the user's vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: RecordId,
    pub word: String,
    pub translation: String,
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub removed: bool,
    #[serde(flatten)]
    pub meta: SyncMetadata,
}

impl Suggestion {
    pub fn new(
        id: impl Into<RecordId>,
        word: impl Into<String>,
        translation: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            word: word.into(),
            translation: translation.into(),
            accepted: false,
            removed: false,
            meta: SyncMetadata::new_local(now),
        }
    }

    /// Accept the suggestion, producing the word it proposes.
    ///
    /// Both the suggestion and the new word are pending local edits.
    pub fn accept(&mut self, word_id: impl Into<RecordId>, now: Timestamp) -> Word {
        self.accepted = true;
        self.touch(now);
        Word::new(word_id, self.word.clone(), self.translation.clone(), now)
    }

    pub fn remove(&mut self, now: Timestamp) {
        self.removed = true;
        self.touch(now);
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A record with arbitrary JSON payload fields.
///
/// Used where the entity type is not known statically: the FFI surface and
/// the reference server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonRecord {
    pub id: RecordId,
    #[serde(flatten)]
    pub meta: SyncMetadata,
    /// Every other field of the object
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl JsonRecord {
    pub fn new(
        id: impl Into<RecordId>,
        fields: serde_json::Map<String, serde_json::Value>,
        meta: SyncMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            meta,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// Whether the payload carries `"removed": true`.
    pub fn is_removed(&self) -> bool {
        self.fields
            .get("removed")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
