use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::post::{CreatePostRequest, NewPost, PostListParams, UpdatePostRequest},
    state::DynStore,
    utils::{id::parse_id, jwt::UserClaims},
};

/// Create a new board post.
/// Requires: user session. The author name comes from the synced profile
/// when there is one, otherwise from the session.
pub async fn create_post(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    payload.validate()?;

    let author = store
        .find_user_by_google_id(&claims.sub)
        .await?
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| claims.name.clone());

    let post = store
        .create_post(NewPost {
            title: payload.title,
            content: payload.content,
            author,
            user_id: claims.sub.clone(),
            image_urls: payload.image_urls,
        })
        .await?;

    tracing::info!(post_id = %post.id, user_id = %claims.sub, "board post created");

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (Recent first).
/// Supports cursor-based pagination.
pub async fn list_posts(
    State(store): State<DynStore>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let posts = store
        .list_posts(params.cursor(), params.effective_limit())
        .await?;

    Ok(Json(posts))
}

/// Get a single post by ID.
/// Every fetch counts as a view.
pub async fn get_post(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "post")?;

    let post = store
        .increment_views(id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Edit a post's title and content.
/// Requires: user session + ownership.
pub async fn update_post(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "post")?;
    let payload = payload.trimmed();
    payload.validate()?;

    // 1. Fetch Post to check ownership
    let post = store
        .get_post(id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    // 2. Check Permission
    if !post.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this post".to_string(),
        ));
    }

    // 3. Update
    let post = store
        .update_post(id, &payload.title, &payload.content)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Delete a post (Hard Delete, comments included).
/// Requires: user session + ownership.
pub async fn delete_post(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "post")?;

    let post = store
        .get_post(id)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if !post.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this post".to_string(),
        ));
    }

    if !store.delete_post(id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(post_id = %id, "board post deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Toggle Like on a post.
/// Requires: user session.
pub async fn toggle_like(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "post")?;

    let state = store
        .toggle_like(id, &claims.sub)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(state))
}
