use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use super::repo_types::{Document, NewDocument};
use crate::{
    auth::repo_types::User, error::AppError, storage::StorageClient, store::UnitOfWork,
};

pub const PDF: &str = "application/pdf";
pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub struct UploadItem {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Only the accepted document types have an extension.
fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        PDF => Some("pdf"),
        DOCX => Some("docx"),
        _ => None,
    }
}

/// Stores the bytes, then records the metadata for `owner`. If the metadata write fails
/// the stored object is removed again.
pub async fn upload_document(
    storage: &dyn StorageClient,
    uow: &mut dyn UnitOfWork,
    owner: &User,
    item: UploadItem,
) -> Result<Document, AppError> {
    let content_type = item.content_type.unwrap_or_default();
    let Some(ext) = ext_from_mime(&content_type) else {
        warn!(user_id = owner.id, %content_type, "rejected upload type");
        return Err(AppError::BadRequest(
            "Only PDF and DOCX files are allowed.".into(),
        ));
    };

    let key = format!("{}.{}", Uuid::new_v4(), ext);
    let size = item.body.len();
    let file_path = storage.put_object(&key, item.body, &content_type).await?;

    let new_doc = NewDocument {
        filename: item
            .filename
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "unknown".into()),
        file_path,
        content_type,
        owner_id: owner.id,
    };
    let doc = match uow.insert_document(new_doc).await {
        Ok(doc) => doc,
        Err(e) => {
            if let Err(cleanup) = storage.delete_object(&key).await {
                warn!(error = %cleanup, %key, "orphaned object after failed insert");
            }
            return Err(e.into());
        }
    };

    info!(user_id = owner.id, document_id = doc.id, size, "document uploaded");
    Ok(doc)
}

pub async fn list_documents(
    uow: &mut dyn UnitOfWork,
    owner: &User,
) -> Result<Vec<Document>, AppError> {
    Ok(uow.documents_by_owner(owner.id).await?)
}
