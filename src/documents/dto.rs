use serde::Serialize;

use super::repo_types::Document;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentView {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub content_type: String,
    pub owner_id: i64,
}

impl From<Document> for DocumentView {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename,
            file_path: doc.file_path,
            content_type: doc.content_type,
            owner_id: doc.owner_id,
        }
    }
}
