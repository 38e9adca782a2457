use axum::{Extension, Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::user::{NicknameRequest, SyncUserRequest, UserProfile},
    state::DynStore,
    utils::{jwt::UserClaims, optional_text},
};

/// Upserts the signed-in user's profile.
/// Called by the sign-in layer after every external sign-in.
pub async fn sync_user(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    AppJson(payload): AppJson<SyncUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = SyncUserRequest {
        name: payload.name.trim().to_string(),
        ..payload
    };
    payload.validate()?;

    let user = store
        .upsert_user(UserProfile {
            google_id: claims.sub.clone(),
            name: payload.name,
            email: optional_text(payload.email),
            image: optional_text(payload.image),
        })
        .await?;

    tracing::debug!(user_id = %user.id, "user profile synced");

    Ok(Json(user))
}

/// Get the current user's synced profile.
pub async fn me(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .find_user_by_google_id(&claims.sub)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Sets the current user's nickname. Nicknames are unique.
pub async fn set_nickname(
    State(store): State<DynStore>,
    Extension(claims): Extension<UserClaims>,
    AppJson(payload): AppJson<NicknameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let nickname = payload.nickname.trim().to_string();
    NicknameRequest {
        nickname: nickname.clone(),
    }
    .validate()?;

    let user = store
        .set_nickname(&claims.sub, &nickname)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
