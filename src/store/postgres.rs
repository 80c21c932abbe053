use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use tracing::debug;

use super::{Store, StoreError, UnitOfWork};
use crate::{
    auth::repo_types::User,
    documents::repo_types::{Document, NewDocument},
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// One database transaction. sqlx rolls it back when dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn insert_user(&mut self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn insert_document(&mut self, doc: NewDocument) -> Result<Document, StoreError> {
        let document = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (filename, file_path, content_type, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, filename, file_path, content_type, owner_id, created_at
            "#,
        )
        .bind(&doc.filename)
        .bind(&doc.file_path)
        .bind(&doc.content_type)
        .bind(doc.owner_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(document)
    }

    async fn documents_by_owner(&mut self, owner_id: i64) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, Document>(
            r#"
            SELECT id, filename, file_path, content_type, owner_id, created_at
              FROM documents
             WHERE owner_id = $1
             ORDER BY id ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        debug!("transaction committed");
        Ok(())
    }
}
