//! Post-upload validation pipeline.
//!
//! After a client uploads directly to storage, the claimed object is checked
//! before any metadata is recorded:
//!
//! 1. the key must lie inside the caller's namespace;
//! 2. the object must exist;
//! 3. its size must not exceed the configured bound;
//! 4. its leading bytes must sniff to an allowed content type.
//!
//! An object that fails the size or content-type gate is deleted from
//! storage so a rejected upload cannot be re-claimed later.

use filestore_core::{
    keys,
    sniff::{self, SNIFF_WINDOW_BYTES},
    AppError,
};
use filestore_storage::ObjectStorage;

use crate::error::translate_storage_error;

/// Validate an uploaded object and return its sniffed content type.
///
/// Checks run in order and short-circuit; a key outside the caller's
/// namespace never touches storage at all.
pub async fn inspect_uploaded_object(
    storage: &dyn ObjectStorage,
    max_file_size_bytes: u64,
    allowed_content_types: &[String],
    identity: &str,
    file_key: &str,
) -> Result<String, AppError> {
    if !keys::is_owned_by(file_key, identity) {
        tracing::warn!(
            identity = %identity,
            file_key = %file_key,
            "Upload claim for key outside caller namespace"
        );
        return Err(AppError::InvalidKey("invalid file key.".to_string()));
    }

    let head = storage
        .head(file_key)
        .await
        .map_err(|e| translate_storage_error(e, "could not inspect uploaded file."))?;

    if head.content_length > max_file_size_bytes {
        tracing::warn!(
            file_key = %file_key,
            size = head.content_length,
            limit = max_file_size_bytes,
            "Uploaded object exceeds size limit, deleting"
        );
        remove_rejected(storage, file_key).await;
        return Err(AppError::InvalidInput("File too large.".to_string()));
    }

    let header = storage
        .read_prefix(file_key, SNIFF_WINDOW_BYTES)
        .await
        .map_err(|e| translate_storage_error(e, "could not inspect uploaded file."))?;

    let content_type = sniff::sniff_mime(&header);

    match content_type {
        Some(mime) if allowed_content_types.iter().any(|a| a == mime) => Ok(mime.to_string()),
        other => {
            tracing::warn!(
                file_key = %file_key,
                sniffed = other.unwrap_or("unknown"),
                "Uploaded object has disallowed content type, deleting"
            );
            remove_rejected(storage, file_key).await;
            Err(AppError::InvalidInput("invalid content type.".to_string()))
        }
    }
}

/// Best-effort removal of a rejected object. The client already gets a
/// validation error; a failed cleanup is logged, not surfaced.
async fn remove_rejected(storage: &dyn ObjectStorage, file_key: &str) {
    if let Err(e) = storage.delete(file_key).await {
        tracing::error!(file_key = %file_key, error = %e, "Failed to delete rejected upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestore_storage::test_helpers::MockObjectStore;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F', 0, 1];

    const MAX_SIZE: u64 = 1024;

    fn allowed() -> Vec<String> {
        vec!["image/png".to_string(), "application/pdf".to_string()]
    }

    #[tokio::test]
    async fn accepts_owned_object_with_allowed_type() {
        let store = MockObjectStore::new();
        let key = "attachments/files/u1/abc.png";
        store.put_object(key, PNG_MAGIC.to_vec());

        let mime = inspect_uploaded_object(&store, MAX_SIZE, &allowed(), "u1", key)
            .await
            .expect("valid upload");

        assert_eq!(mime, "image/png");
        assert!(store.has_object(key));
    }

    #[tokio::test]
    async fn foreign_namespace_is_rejected_without_storage_calls() {
        let store = MockObjectStore::new();
        let key = "attachments/files/u2/abc.png";
        store.put_object(key, PNG_MAGIC.to_vec());

        let err = inspect_uploaded_object(&store, MAX_SIZE, &allowed(), "u1", key)
            .await
            .expect_err("foreign key");

        assert_eq!(err.client_message(), "invalid file key.");
        assert!(store.operations().is_empty());
        assert!(store.has_object(key));
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = MockObjectStore::new();

        let err = inspect_uploaded_object(
            &store,
            MAX_SIZE,
            &allowed(),
            "u1",
            "attachments/files/u1/missing.png",
        )
        .await
        .expect_err("missing object");

        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.client_message(), "file not found.");
    }

    #[tokio::test]
    async fn oversized_object_is_deleted() {
        let store = MockObjectStore::new();
        let key = "attachments/files/u1/big.png";
        let mut data = PNG_MAGIC.to_vec();
        data.resize(MAX_SIZE as usize + 1, 0);
        store.put_object(key, data);

        let err = inspect_uploaded_object(&store, MAX_SIZE, &allowed(), "u1", key)
            .await
            .expect_err("oversized");

        assert_eq!(err.client_message(), "File too large.");
        assert!(!store.has_object(key));
        // Size gate fires before any bytes are read
        assert_eq!(
            store.operations(),
            vec![format!("head {}", key), format!("delete {}", key)]
        );
    }

    #[tokio::test]
    async fn disallowed_content_type_is_deleted() {
        let store = MockObjectStore::new();
        let key = "attachments/files/u1/sneaky.png";
        store.put_object(key, JPEG_MAGIC.to_vec());

        let err = inspect_uploaded_object(&store, MAX_SIZE, &allowed(), "u1", key)
            .await
            .expect_err("jpeg not in allow-list");

        assert_eq!(err.client_message(), "invalid content type.");
        assert!(!store.has_object(key));
    }

    #[tokio::test]
    async fn unrecognizable_bytes_are_deleted() {
        let store = MockObjectStore::new();
        let key = "attachments/files/u1/noise.png";
        store.put_object(key, b"no magic signature here".to_vec());

        let err = inspect_uploaded_object(&store, MAX_SIZE, &allowed(), "u1", key)
            .await
            .expect_err("no signature");

        assert_eq!(err.client_message(), "invalid content type.");
        assert!(!store.has_object(key));
    }
}
