use axum::{body::Bytes, routing::get, Router};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::{
    context::TripContext,
    error::AppError,
    models::trip::Trip,
    services::store::SetMode,
    state::AppState,
};

pub const TRIPS_COLLECTION: &str = "Trips";

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/Trips/:documentid",
        get(read_trip)
            .post(create_trip)
            .patch(update_trip)
            .delete(delete_trip),
    )
}

#[instrument(skip_all, fields(request_id = %ctx.request_id, document = %ctx.document_id))]
async fn read_trip(ctx: TripContext) -> Result<String, AppError> {
    let document = ctx
        .store
        .get(TRIPS_COLLECTION, &ctx.document_id)
        .await?
        .ok_or(AppError::NotFound)?;
    debug!(
        created = %document.create_time,
        updated = %document.update_time,
        "read trip"
    );

    let data =
        serde_json::to_string(&document.fields).map_err(|err| AppError::Other(err.into()))?;
    Ok(format!("Data from {}\nDocument Data: {data}", ctx.document_id))
}

#[instrument(skip_all, fields(request_id = %ctx.request_id, document = %ctx.document_id))]
async fn create_trip(ctx: TripContext, body: Bytes) -> Result<String, AppError> {
    let trip = Trip::from_body(decode_object(&body)?)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;
    let fields = trip.to_fields().map_err(|err| AppError::Other(err.into()))?;

    ctx.store
        .set(TRIPS_COLLECTION, &ctx.document_id, fields, SetMode::Replace)
        .await?;
    info!("trip created");

    Ok(format!(
        "{trip:?}\nDocument {} was created",
        ctx.document_id
    ))
}

/// Merges a schema-free object into the stored trip.
#[instrument(skip_all, fields(request_id = %ctx.request_id, document = %ctx.document_id))]
async fn update_trip(ctx: TripContext, body: Bytes) -> Result<String, AppError> {
    let fields = Trip::canonicalize_keys(decode_object(&body)?)
        .map_err(|err| AppError::BadRequest(err.to_string()))?;
    debug!(keys = ?fields.keys().collect::<Vec<_>>(), "merging");

    ctx.store
        .set(TRIPS_COLLECTION, &ctx.document_id, fields, SetMode::Merge)
        .await?;
    info!("trip updated");

    Ok(format!("Document {} was updated", ctx.document_id))
}

#[instrument(skip_all, fields(request_id = %ctx.request_id, document = %ctx.document_id))]
async fn delete_trip(ctx: TripContext) -> Result<String, AppError> {
    if ctx.store.delete(TRIPS_COLLECTION, &ctx.document_id).await? {
        info!("trip deleted");
    } else {
        debug!("nothing to delete");
    }

    Ok(format!("Document {} was deleted", ctx.document_id))
}

fn decode_object(body: &[u8]) -> Result<Map<String, Value>, AppError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
        Err(err) => Err(AppError::BadRequest(format!("invalid JSON body: {err}"))),
    }
}
