use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Raw token from `Authorization: Bearer <token>`. Only checks presence and scheme;
/// see `resolver::resolve_principal` for verification.
#[derive(Debug)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::NotAuthenticated)?;

        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or(AppError::NotAuthenticated)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AppError::NotAuthenticated);
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::NotAuthenticated);
        }
        Ok(BearerToken(token.to_owned()))
    }
}

/// `Json<T>` whose rejections render as `{"detail": ...}` like every other error.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
