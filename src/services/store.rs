use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

pub type Fields = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("stored document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("stored document is not a JSON object")]
    NotAnObject,
}

/// How a write treats fields already stored under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    /// Overwrite the whole document.
    Replace,
    /// Update only the supplied fields; see [`merge_fields`].
    Merge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

/// Document access by collection name and document id.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Returns `None` when no document exists under `id`.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Writes `fields` under `id`, creating the document if needed.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError>;

    /// Returns `true` if a document existed and was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

/// Merges `patch` into `target`.
///
/// Nested objects merge recursively; every other value, arrays and null
/// included, replaces what was stored.
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                merge_fields(existing, nested);
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

pub(crate) fn into_fields(value: Value) -> Result<Fields, StoreError> {
    match value {
        Value::Object(fields) => Ok(fields),
        _ => Err(StoreError::NotAnObject),
    }
}
