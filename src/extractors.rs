use axum::{
    Json,
    extract::{FromRef, FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::AppError,
    utils::jwt::{UserClaims, bearer_token, verify_session_token},
};

/// A `Json<T>` wrapper that converts body rejections into `AppError::BadRequest`,
/// so malformed bodies get the same JSON error shape as every other failure.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(AppJson(value))
    }
}

/// The user session if one was presented.
///
/// No `Authorization` header yields `None`; a header carrying a bad or
/// expired token is still rejected with 401.
pub struct OptionalUser(pub Option<UserClaims>);

impl<S> FromRequestParts<S> for OptionalUser
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);
        match bearer_token(&parts.headers)? {
            Some(token) => Ok(OptionalUser(Some(verify_session_token(
                token,
                &config.session_secret,
            )?))),
            None => Ok(OptionalUser(None)),
        }
    }
}
