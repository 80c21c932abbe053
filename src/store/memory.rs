use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Store, StoreError, UnitOfWork};
use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, NewDocument},
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    documents: Vec<Document>,
    next_user_id: i64,
    next_document_id: i64,
}

/// Process-local store used by tests. Units of work are serialized: each one holds the
/// table lock for its whole lifetime and works on a staged copy that `commit` publishes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.staged.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        if self.staged.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation);
        }
        self.staged.next_user_id += 1;
        let user = User {
            id: self.staged.next_user_id,
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.staged.users.push(user.clone());
        Ok(user)
    }

    async fn insert_document(&mut self, doc: NewDocument) -> Result<Document, StoreError> {
        self.staged.next_document_id += 1;
        let document = Document {
            id: self.staged.next_document_id,
            filename: doc.filename,
            file_path: doc.file_path,
            content_type: doc.content_type,
            owner_id: doc.owner_id,
            created_at: OffsetDateTime::now_utc(),
        };
        self.staged.documents.push(document.clone());
        Ok(document)
    }

    async fn documents_by_owner(&mut self, owner_id: i64) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .staged
            .documents
            .iter()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
