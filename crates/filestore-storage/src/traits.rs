//! Storage abstraction trait
//!
//! All storage backends must implement [`ObjectStorage`]. The HTTP layer
//! only ever talks to this trait, so the validation pipeline can be tested
//! against the in-memory mock in `test_helpers`.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Credentials missing or unresolvable. Surfaces to clients as
    /// "storage not configured.".
    #[error("Storage credentials unavailable: {0}")]
    NoCredentials(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Storage configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object metadata from a head request.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHead {
    pub content_length: u64,
}

/// A time-limited, form-based upload grant. Clients POST the form fields
/// plus the file to `url`; the policy embedded in `fields` bounds the
/// object's size and requires server-side encryption.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PresignedPost {
    pub url: String,
    pub fields: serde_json::Value,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Fetch object metadata. `NotFound` if no object exists at `key`.
    async fn head(&self, key: &str) -> StorageResult<ObjectHead>;

    /// Read at most `max_bytes` leading bytes of the object.
    async fn read_prefix(&self, key: &str, max_bytes: u64) -> StorageResult<Bytes>;

    /// Delete the object at `key`. Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Presigned, read-only GET URL with the response content type and an
    /// inline content disposition carrying the original filename.
    async fn presigned_download_url(
        &self,
        key: &str,
        content_type: &str,
        original_file_name: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// Presigned POST grant for a direct upload to `key`, constrained to
    /// a content length between 1 and `max_size_bytes` and to server-side
    /// encryption.
    async fn presigned_upload_post(
        &self,
        key: &str,
        max_size_bytes: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedPost>;
}
