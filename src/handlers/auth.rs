// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{ADMIN_TOKEN_TTL_SECS, Config},
    error::AppError,
    extractors::AppJson,
    models::admin::{Admin, AdminSummary, ChangePasswordRequest, LoginRequest, LoginResponse},
    state::DynStore,
    utils::{
        hash::{dummy_hash, hash_password, verify_password},
        jwt::{AdminClaims, sign_admin_token},
    },
};

/// The one message for every credential failure, so responses never reveal
/// whether an email is registered.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

async fn admin_from_claims(store: &DynStore, claims: &AdminClaims) -> Result<Admin, AppError> {
    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    store
        .get_admin(id)
        .await?
        .ok_or(AppError::AuthError("Admin account no longer exists".to_string()))
}

/// Authenticates an admin and returns a bearer token.
///
/// Verifies the email and password against the store. On success records
/// the login time and signs a 7-day token carrying id, email and role.
pub async fn login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let Some(admin) = store.find_admin_by_email(&email).await? else {
        // Same argon2 cost as a real check.
        let _ = verify_password(&payload.password, dummy_hash());
        tracing::warn!("Admin login failed: unknown email");
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(&payload.password, &admin.password_hash)? {
        tracing::warn!(admin_id = %admin.id, "Admin login failed: wrong password");
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    store.record_admin_login(admin.id, Utc::now()).await?;

    let token = sign_admin_token(&admin, &config.admin_jwt_secret, ADMIN_TOKEN_TTL_SECS)?;

    tracing::info!(admin_id = %admin.id, role = %admin.role, "Admin logged in");

    Ok(Json(LoginResponse {
        token,
        admin: AdminSummary {
            email: admin.email,
            name: admin.name,
            role: admin.role,
        },
    }))
}

/// Returns the profile of the admin the token was issued to.
pub async fn me(
    State(store): State<DynStore>,
    Extension(claims): Extension<AdminClaims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(admin_from_claims(&store, &claims).await?))
}

/// Changes the calling admin's password after checking the current one.
pub async fn change_password(
    State(store): State<DynStore>,
    Extension(claims): Extension<AdminClaims>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let admin = admin_from_claims(&store, &claims).await?;

    if !verify_password(&payload.current_password, &admin.password_hash)? {
        return Err(AppError::AuthError(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed = hash_password(&payload.new_password)?;
    if !store.update_admin_password(admin.id, &hashed).await? {
        return Err(AppError::AuthError(
            "Admin account no longer exists".to_string(),
        ));
    }

    tracing::info!(admin_id = %admin.id, "Admin password changed");

    Ok(Json(json!({ "message": "Password updated" })))
}
