use std::sync::Arc;

use crate::services::store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: impl DocumentStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
