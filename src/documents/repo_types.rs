use sqlx::FromRow;
use time::OffsetDateTime;

/// Uploaded document metadata. The bytes live in the storage backend at `file_path`.
#[derive(Debug, Clone, FromRow)]
pub struct Document {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub content_type: String,
    pub owner_id: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub file_path: String,
    pub content_type: String,
    pub owner_id: i64,
}
