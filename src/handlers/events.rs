use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::event::{EventRequest, PinRequest},
    state::DynStore,
    store::EventListing,
    utils::id::parse_id,
};

/// Lists all events, pinned first, then latest date first.
/// Admin only.
pub async fn list_events(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_events(EventListing::Admin).await?))
}

/// Public: upcoming events plus pinned ones, pinned first, then soonest first.
pub async fn list_upcoming_events(
    State(store): State<DynStore>,
) -> Result<impl IntoResponse, AppError> {
    let events = store
        .list_events(EventListing::Upcoming { now: Utc::now() })
        .await?;
    Ok(Json(events))
}

/// Creates a new event. Type defaults to "other".
/// Admin only.
pub async fn create_event(
    State(store): State<DynStore>,
    AppJson(payload): AppJson<EventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.into_input()?;
    let event = store.create_event(input).await?;

    tracing::info!(event_id = %event.id, kind = %event.kind, "event created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// Get a single event by ID.
/// Admin only.
pub async fn get_event(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "event")?;

    let event = store
        .get_event(id)
        .await?
        .ok_or(AppError::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

/// Replaces an event's fields. The pin flag is left as is.
/// Admin only.
pub async fn update_event(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<EventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "event")?;
    let input = payload.into_input()?;

    let event = store
        .update_event(id, input)
        .await?
        .ok_or(AppError::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

/// Pins or unpins an event.
/// Admin only.
pub async fn pin_event(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<PinRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "event")?;

    let event = store
        .set_event_pinned(id, payload.is_pinned)
        .await?
        .ok_or(AppError::NotFound("Event not found".to_string()))?;

    Ok(Json(event))
}

/// Deletes an event by ID.
/// Admin only.
pub async fn delete_event(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "event")?;

    if !store.delete_event(id).await? {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    Ok(Json(json!({ "message": "Event deleted", "id": id })))
}
