use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::concert::{ActivateRequest, ConcertDeleted, ConcertRequest},
    state::DynStore,
    utils::id::parse_id,
};

/// Lists all concerts, latest start date first.
pub async fn list_concerts(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_concerts().await?))
}

/// Creates a new concert.
/// Admin only.
pub async fn create_concert(
    State(store): State<DynStore>,
    AppJson(payload): AppJson<ConcertRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.into_input()?;
    let concert = store.create_concert(input).await?;

    tracing::info!(concert_id = %concert.id, "concert created");

    Ok((StatusCode::CREATED, Json(concert)))
}

/// Get a single concert by ID.
pub async fn get_concert(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "concert")?;

    let concert = store
        .get_concert(id)
        .await?
        .ok_or(AppError::NotFound("Concert not found".to_string()))?;

    Ok(Json(concert))
}

/// Replaces a concert's fields.
/// Admin only.
pub async fn update_concert(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ConcertRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "concert")?;
    let input = payload.into_input()?;

    let concert = store
        .update_concert(id, input)
        .await?
        .ok_or(AppError::NotFound("Concert not found".to_string()))?;

    Ok(Json(concert))
}

/// Deletes a concert together with all of its setlists.
/// Admin only.
pub async fn delete_concert(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "concert")?;

    let deleted_setlists = store
        .delete_concert(id)
        .await?
        .ok_or(AppError::NotFound("Concert not found".to_string()))?;

    tracing::info!(concert_id = %id, deleted_setlists, "concert deleted");

    Ok(Json(ConcertDeleted {
        message: "Concert deleted".to_string(),
        id,
        deleted_setlists,
    }))
}

/// Marks a concert as the active one, or clears it.
/// Admin only. At most one concert is active at a time.
pub async fn activate_concert(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ActivateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "concert")?;

    let concert = store
        .set_active_concert(id, payload.is_active)
        .await?
        .ok_or(AppError::NotFound("Concert not found".to_string()))?;

    tracing::info!(concert_id = %id, active = concert.is_active, "concert activation changed");

    Ok(Json(concert))
}

/// Public: the concert currently featured on the site.
pub async fn get_active_concert(
    State(store): State<DynStore>,
) -> Result<impl IntoResponse, AppError> {
    let concert = store
        .active_concert()
        .await?
        .ok_or(AppError::NotFound("No active concert".to_string()))?;

    Ok(Json(concert))
}
