use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::store::{merge_fields, Document, DocumentStore, Fields, SetMode, StoreError};

type Key = (String, String);

/// Keeps documents in process memory. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<Key, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(collection: &str, id: &str) -> Key {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&key(collection, id)).cloned())
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mode: SetMode,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut documents = self.documents.write().await;
        match documents.entry(key(collection, id)) {
            Entry::Occupied(mut entry) => {
                let document = entry.get_mut();
                match mode {
                    SetMode::Replace => document.fields = fields,
                    SetMode::Merge => merge_fields(&mut document.fields, fields),
                }
                document.update_time = now;
            }
            Entry::Vacant(entry) => {
                entry.insert(Document {
                    id: id.to_string(),
                    fields,
                    create_time: now,
                    update_time: now,
                });
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(&key(collection, id)).is_some())
    }
}
