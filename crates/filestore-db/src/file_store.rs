//! Repository for the `userfilestore` table.
//!
//! A row exists only for uploads that passed post-upload validation. The
//! unique index on `file_key` is the serialization point for concurrent
//! duplicate registrations; no application-level locking is used.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filestore_core::AppError;
use sqlx::PgPool;

/// One registered, validated upload.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct FileRecord {
    pub id: i64,
    pub user_id: String,
    pub file_key: String,
    pub file_category: String,
    pub file_content_type: String,
    pub original_file_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence operations the HTTP layer depends on. The Postgres-backed
/// implementation lives below; tests use the in-memory one in
/// [`crate::test_helpers`].
#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a new record. A uniqueness-constraint violation (a concurrent
    /// registration of the same key won the race) is reported as a conflict,
    /// not a database error.
    async fn insert(
        &self,
        user_id: &str,
        file_key: &str,
        file_category: &str,
        file_content_type: &str,
        original_file_name: &str,
    ) -> Result<FileRecord, AppError>;

    /// Pre-insert duplicate check for a (owner, key) pair.
    async fn find_by_owner_and_key(
        &self,
        user_id: &str,
        file_key: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Ownership-scoped lookup: a record owned by someone else is
    /// indistinguishable from a missing one.
    async fn find_by_id_for_owner(
        &self,
        id: i64,
        user_id: &str,
    ) -> Result<Option<FileRecord>, AppError>;

    /// Unscoped lookup used by the deletion flow.
    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, AppError>;

    /// Delete a record by id. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct FileStoreRepository {
    pool: PgPool,
}

impl FileStoreRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for FileStoreRepository {
    async fn insert(
        &self,
        user_id: &str,
        file_key: &str,
        file_category: &str,
        file_content_type: &str,
        original_file_name: &str,
    ) -> Result<FileRecord, AppError> {
        let result = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO userfilestore (
                user_id, file_key, file_category, file_content_type, original_file_name
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, file_key, file_category, file_content_type,
                      original_file_name, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(file_key)
        .bind(file_category)
        .bind(file_content_type)
        .bind(original_file_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(record) => Ok(record),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::warn!(
                    user_id = %user_id,
                    file_key = %file_key,
                    "Duplicate registration lost insert race"
                );
                Err(AppError::Conflict("File already registered.".to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_owner_and_key(
        &self,
        user_id: &str,
        file_key: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, user_id, file_key, file_category, file_content_type,
                   original_file_name, created_at, updated_at
            FROM userfilestore
            WHERE user_id = $1 AND file_key = $2
            "#,
        )
        .bind(user_id)
        .bind(file_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id_for_owner(
        &self,
        id: i64,
        user_id: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, user_id, file_key, file_category, file_content_type,
                   original_file_name, created_at, updated_at
            FROM userfilestore
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            SELECT id, user_id, file_key, file_category, file_content_type,
                   original_file_name, created_at, updated_at
            FROM userfilestore
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM userfilestore WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
