// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    config::Config,
    error::AppError,
    models::admin::{Admin, AdminRole},
};

/// Claims carried by an admin bearer token.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminClaims {
    /// Subject - Stores the Admin ID (as string).
    pub sub: String,
    pub email: String,
    pub role: AdminRole,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Claims carried by a user session token issued by the sign-in layer.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct UserClaims {
    /// Subject - the stable external user id.
    pub sub: String,
    /// Display name reported at sign-in.
    pub name: String,
    pub exp: usize,
}

fn now_secs() -> Result<usize, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize)
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, AppError> {
    let token_data = decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid or expired token".to_string()))?;

    Ok(token_data.claims)
}

/// Signs an admin bearer token valid for `expiration_seconds`.
pub fn sign_admin_token(
    admin: &Admin,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let now = now_secs()?;
    let claims = AdminClaims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        role: admin.role,
        iat: now,
        exp: now + expiration_seconds as usize,
    };
    sign(&claims, secret)
}

pub fn verify_admin_token(token: &str, secret: &str) -> Result<AdminClaims, AppError> {
    verify(token, secret)
}

/// Signs a user session token. The sign-in layer shares `secret` with this service.
pub fn sign_session_token(
    user_id: &str,
    name: &str,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let claims = UserClaims {
        sub: user_id.to_owned(),
        name: name.to_owned(),
        exp: now_secs()? + expiration_seconds as usize,
    };
    sign(&claims, secret)
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<UserClaims, AppError> {
    verify(token, secret)
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// `Ok(None)` when the header is absent, an error when it is present but malformed.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Some)
        .ok_or_else(|| AppError::AuthError("Malformed Authorization header".to_string()))
}

fn required_bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    bearer_token(headers)?.ok_or_else(|| AppError::AuthError("Authentication required".to_string()))
}

/// Axum Middleware: admin gate.
///
/// Validates the admin bearer token before the wrapped handler runs and
/// injects the decoded `AdminClaims` into the request extensions.
pub async fn require_admin(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_admin_token(required_bearer(req.headers())?, &config.admin_jwt_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: user session gate.
///
/// Same contract as `require_admin`, for tokens from the sign-in layer.
pub async fn require_user(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_session_token(required_bearer(req.headers())?, &config.session_secret)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
