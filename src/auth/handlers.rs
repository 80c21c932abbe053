use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest, TokenResponse},
        extractors::JsonBody,
        services::{self, duplicate_on_conflict, ensure_valid_email},
    },
    error::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    ensure_valid_email(&payload.email)?;

    let mut uow = state.store.begin().await?;
    let user = services::register(&state.hasher, uow.as_mut(), &payload.email, &payload.password)
        .await?;
    uow.commit().await.map_err(duplicate_on_conflict)?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    ensure_valid_email(&payload.email)?;

    let mut uow = state.store.begin().await?;
    let token = services::login(
        &state.hasher,
        &state.tokens,
        uow.as_mut(),
        &payload.email,
        &payload.password,
    )
    .await?;
    uow.commit().await?;

    Ok(Json(token))
}
