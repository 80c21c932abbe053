use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::DocumentView,
    services::{list_documents, upload_document, UploadItem},
};
use crate::{
    auth::{extractors::BearerToken, resolver::resolve_principal},
    error::AppError,
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/documents/me", get(list_my_documents))
}

pub fn write_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/documents/upload", post(upload))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// POST /documents/upload (multipart, field `file`)
///
/// The body is read before a unit of work is opened so slow uploads do not hold a
/// database connection.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<DocumentView>), AppError> {
    let item = read_file_field(&mut mp).await?;

    let mut uow = state.store.begin().await?;
    let user = resolve_principal(&state.tokens, uow.as_mut(), &token).await?;
    let doc = upload_document(state.storage.as_ref(), uow.as_mut(), &user, item).await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(doc.into())))
}

async fn read_file_field(mp: &mut Multipart) -> Result<UploadItem, AppError> {
    while let Some(field) = mp.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let body = field.bytes().await?;
        return Ok(UploadItem {
            filename,
            content_type,
            body,
        });
    }
    Err(AppError::Validation("file is required".into()))
}

/// GET /documents/me
#[instrument(skip_all)]
pub async fn list_my_documents(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<Vec<DocumentView>>, AppError> {
    let mut uow = state.store.begin().await?;
    let user = resolve_principal(&state.tokens, uow.as_mut(), &token).await?;
    let docs = list_documents(uow.as_mut(), &user).await?;
    uow.commit().await?;

    Ok(Json(docs.into_iter().map(DocumentView::from).collect()))
}
