use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::{AppJson, OptionalUser},
    models::comment::{
        CommentListResponse, CreateCommentRequest, NewComment, UpdateCommentRequest, build_tree,
    },
    state::DynStore,
    utils::{id::parse_id, jwt::UserClaims},
};

/// List all comments for a post as a two-level tree, oldest first.
/// Deleted comments stay in place with their content and author hidden.
pub async fn list_comments(
    State(store): State<DynStore>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let board_id = parse_id(&board_id, "post")?;

    if store.get_post(board_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let comments: Vec<_> = store
        .list_comments(board_id)
        .await?
        .into_iter()
        .map(|c| c.redacted())
        .collect();
    let total = comments.len();

    Ok(Json(CommentListResponse {
        comments: build_tree(comments),
        total,
    }))
}

/// Create a new comment or reply.
/// A user session is optional; without one the comment is anonymous and
/// can never be edited or deleted.
pub async fn create_comment(
    State(store): State<DynStore>,
    OptionalUser(claims): OptionalUser,
    Path(board_id): Path<String>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validate payload
    let board_id = parse_id(&board_id, "post")?;
    let payload = payload.trimmed();
    payload.validate()?;

    let parent_id = payload
        .parent_id
        .as_deref()
        .map(|raw| parse_id(raw, "parent comment"))
        .transpose()?;

    // 2. Board must exist
    if store.get_post(board_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    // 3. Replies hang off a top-level comment of the same post
    let depth = match parent_id {
        Some(pid) => {
            let parent = store
                .get_comment(pid)
                .await?
                .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;

            if parent.board_id != board_id {
                return Err(AppError::BadRequest(
                    "Parent comment belongs to another post".to_string(),
                ));
            }
            if parent.depth != 0 {
                return Err(AppError::BadRequest(
                    "Replies to replies are not allowed".to_string(),
                ));
            }
            1
        }
        None => 0,
    };

    // 4. Insert Comment
    let comment = store
        .insert_comment(NewComment {
            board_id,
            content: payload.content,
            author: payload.author,
            user_id: claims.map(|c| c.sub),
            parent_id,
            depth,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Edit a comment's content.
/// Requires: user session + ownership. Deleted comments are frozen.
pub async fn update_comment(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "comment")?;
    let payload = payload.trimmed();
    payload.validate()?;

    let comment = store
        .get_comment(id)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if comment.deleted {
        return Err(AppError::BadRequest(
            "Deleted comments cannot be edited".to_string(),
        ));
    }

    if !comment.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You are not allowed to edit this comment".to_string(),
        ));
    }

    // The update only applies while the comment is live; a concurrent
    // delete makes it a no-op.
    let updated = store
        .update_comment_content(id, &payload.content)
        .await?
        .ok_or(AppError::BadRequest(
            "Deleted comments cannot be edited".to_string(),
        ))?;

    Ok(Json(json!({ "id": updated.id, "content": updated.content })))
}

/// Soft-delete a comment. Replies are left untouched.
/// Requires: user session + ownership.
pub async fn delete_comment(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "comment")?;

    let comment = store
        .get_comment(id)
        .await?
        .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    if comment.deleted {
        return Err(AppError::BadRequest("Comment is already deleted".to_string()));
    }

    if !comment.is_owned_by(&claims.sub) {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this comment".to_string(),
        ));
    }

    if !store.soft_delete_comment(id, Utc::now()).await? {
        return Err(AppError::BadRequest("Comment is already deleted".to_string()));
    }

    tracing::info!(comment_id = %id, "comment soft-deleted");

    Ok(Json(json!({ "message": "Comment deleted", "id": id })))
}
