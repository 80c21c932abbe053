use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database. Never serialized; see `dto::PublicUser`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string
    pub created_at: OffsetDateTime,
}
