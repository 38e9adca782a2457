use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::setlist::{SetList, SetListParams, SetListRequest},
    state::DynStore,
    utils::id::parse_id,
};

async fn ensure_concert(store: &DynStore, concert_id: Uuid) -> Result<(), AppError> {
    match store.get_concert(concert_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("Concert not found".to_string())),
    }
}

async fn sorted_setlists(
    store: &DynStore,
    concert_id: Option<Uuid>,
) -> Result<Vec<SetList>, AppError> {
    Ok(store
        .list_setlists(concert_id)
        .await?
        .into_iter()
        .map(SetList::with_sorted_songs)
        .collect())
}

async fn insert_setlist(
    store: &DynStore,
    payload: SetListRequest,
    route_concert: Option<Uuid>,
) -> Result<SetList, AppError> {
    let input = payload.into_input(route_concert)?;
    ensure_concert(store, input.concert_id).await?;

    let setlist = store.create_setlist(input).await.map_err(|e| {
        tracing::warn!("Failed to create setlist: {}", e);
        AppError::from(e)
    })?;

    tracing::info!(setlist_id = %setlist.id, concert_id = %setlist.concert_id, day = setlist.day, "setlist created");

    Ok(setlist.with_sorted_songs())
}

/// Lists setlists, optionally filtered by `concertId`.
/// Admin only.
pub async fn list_setlists(
    State(store): State<DynStore>,
    Query(params): Query<SetListParams>,
) -> Result<impl IntoResponse, AppError> {
    let concert_id = match params.concert_id.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(parse_id(raw, "concert")?),
        _ => None,
    };

    Ok(Json(sorted_setlists(&store, concert_id).await?))
}

/// Creates a setlist; the concert comes from the body.
/// Admin only. A second setlist for the same concert day is a 409.
pub async fn create_setlist(
    State(store): State<DynStore>,
    AppJson(payload): AppJson<SetListRequest>,
) -> Result<impl IntoResponse, AppError> {
    let setlist = insert_setlist(&store, payload, None).await?;
    Ok((StatusCode::CREATED, Json(setlist)))
}

/// Lists the setlists of one concert (404 if the concert is missing).
pub async fn list_concert_setlists(
    State(store): State<DynStore>,
    Path(concert_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let concert_id = parse_id(&concert_id, "concert")?;
    ensure_concert(&store, concert_id).await?;

    Ok(Json(sorted_setlists(&store, Some(concert_id)).await?))
}

/// Creates a setlist for the concert named in the route.
/// Admin only.
pub async fn create_concert_setlist(
    State(store): State<DynStore>,
    Path(concert_id): Path<String>,
    AppJson(payload): AppJson<SetListRequest>,
) -> Result<impl IntoResponse, AppError> {
    let concert_id = parse_id(&concert_id, "concert")?;
    let setlist = insert_setlist(&store, payload, Some(concert_id)).await?;
    Ok((StatusCode::CREATED, Json(setlist)))
}

/// Get a single setlist by ID, songs in display order.
pub async fn get_setlist(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "setlist")?;

    let setlist = store
        .get_setlist(id)
        .await?
        .ok_or(AppError::NotFound("Setlist not found".to_string()))?;

    Ok(Json(setlist.with_sorted_songs()))
}

/// Replaces a setlist. The songs array is replaced wholesale.
/// Admin only.
pub async fn update_setlist(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<SetListRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "setlist")?;
    let fields = payload.into_fields()?;

    let existing = store
        .get_setlist(id)
        .await?
        .ok_or(AppError::NotFound("Setlist not found".to_string()))?;

    // An update without a concert keeps the current one.
    let concert_id = fields.concert_id.unwrap_or(existing.concert_id);
    let input = fields.for_concert(concert_id);
    ensure_concert(&store, input.concert_id).await?;

    let setlist = store
        .update_setlist(id, input)
        .await?
        .ok_or(AppError::NotFound("Setlist not found".to_string()))?;

    Ok(Json(setlist.with_sorted_songs()))
}

/// Deletes a setlist by ID.
/// Admin only.
pub async fn delete_setlist(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "setlist")?;

    if !store.delete_setlist(id).await? {
        return Err(AppError::NotFound("Setlist not found".to_string()));
    }

    Ok(Json(json!({ "message": "Setlist deleted", "id": id })))
}
