//! Transactional access to users and documents.
//!
//! A request opens one [`UnitOfWork`] through [`Store::begin`], passes it down explicitly and
//! calls [`UnitOfWork::commit`] on success. Dropping an uncommitted unit of work rolls it back,
//! so every early return and `?` releases it.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, NewDocument},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. a second user with the same email).
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation,
            _ => StoreError::Database(e),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;
}

#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the email is taken.
    async fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn insert_document(&mut self, doc: NewDocument) -> Result<Document, StoreError>;

    /// Documents owned by `owner_id`, oldest first.
    async fn documents_by_owner(&mut self, owner_id: i64) -> Result<Vec<Document>, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
