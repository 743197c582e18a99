use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{error::AppError, services::store::DocumentStore, state::AppState};

/// Everything a trip handler needs for one request: an id for log
/// correlation, a handle on the document store and the target document.
///
/// The store handle is a clone of the one built at startup and is dropped
/// with the context when the request finishes.
#[derive(Clone)]
pub struct TripContext {
    pub request_id: Uuid,
    pub store: Arc<dyn DocumentStore>,
    pub document_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for TripContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(document_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

        Ok(Self {
            request_id: Uuid::new_v4(),
            store: Arc::clone(&state.store),
            document_id,
        })
    }
}
