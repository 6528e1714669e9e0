//! Download grant issuance.

use axum::{extract::State, Json};
use filestore_core::AppError;
use filestore_db::FileRepository as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Identity;
use crate::error::{translate_storage_error, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub file_store_id: i64,
    /// Sent by existing clients alongside the id; the authoritative key
    /// always comes from the record.
    #[serde(default)]
    pub file_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DownloadResponse {
    pub download_url: String,
    pub expires_in: u64,
}

/// POST /file/download
///
/// Ownership is enforced by the lookup predicate: a record owned by another
/// identity is indistinguishable from a missing one.
#[tracing::instrument(
    skip_all,
    fields(identity = %identity, file_store_id = request.file_store_id)
)]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Identity(identity): Identity,
    ValidatedJson(request): ValidatedJson<DownloadRequest>,
) -> Result<Json<DownloadResponse>, HttpAppError> {
    let record = state
        .files
        .find_by_id_for_owner(request.file_store_id, &identity)
        .await?
        .ok_or_else(|| AppError::NotFound("file not found.".to_string()))?;

    let expires_in = state.config.presign_expiry_seconds;

    let download_url = state
        .storage
        .presigned_download_url(
            &record.file_key,
            &record.file_content_type,
            &record.original_file_name,
            Duration::from_secs(expires_in),
        )
        .await
        .map_err(|e| translate_storage_error(e, "could not generate download link"))?;

    tracing::info!(
        identity = %identity,
        file_store_id = record.id,
        file_key = %record.file_key,
        expires_in,
        "Issued download grant"
    );

    Ok(Json(DownloadResponse {
        download_url,
        expires_in,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_request_parses_without_file_key() {
        let request: DownloadRequest =
            serde_json::from_str(r#"{"file_store_id": 42}"#).expect("parse");
        assert_eq!(request.file_store_id, 42);
        assert!(request.file_key.is_none());
    }

    #[test]
    fn download_request_accepts_legacy_file_key() {
        let request: DownloadRequest = serde_json::from_str(
            r#"{"file_store_id": 42, "file_key": "attachments/files/u1/x.jpg"}"#,
        )
        .expect("parse");
        assert_eq!(
            request.file_key.as_deref(),
            Some("attachments/files/u1/x.jpg")
        );
    }

    mod grants {
        use super::super::*;
        use crate::auth::Identity;
        use crate::error::ValidatedJson;
        use crate::state::test_support::test_state;
        use axum::extract::State;
        use filestore_db::test_helpers::InMemoryFileRepository;
        use filestore_storage::test_helpers::MockObjectStore;
        use std::sync::Arc;

        #[tokio::test]
        async fn foreign_record_yields_not_found_without_presigning() {
            let store = Arc::new(MockObjectStore::new());
            let repo = Arc::new(InMemoryFileRepository::new());
            let record = repo.seed(
                "u2",
                "attachments/files/u2/doc.pdf",
                "doc",
                "application/pdf",
                "doc.pdf",
            );
            let state = test_state(store.clone(), repo);

            let err = download(
                State(state),
                Identity("u1".to_string()),
                ValidatedJson(DownloadRequest {
                    file_store_id: record.id,
                    file_key: None,
                }),
            )
            .await
            .expect_err("foreign record");

            assert_eq!(err.0.http_status_code(), 404);
            assert_eq!(err.0.client_message(), "file not found.");
            assert!(store.operations().is_empty());
        }

        #[tokio::test]
        async fn owner_receives_grant_with_expiry() {
            let store = Arc::new(MockObjectStore::new());
            let repo = Arc::new(InMemoryFileRepository::new());
            let record = repo.seed(
                "u1",
                "attachments/files/u1/doc.pdf",
                "doc",
                "application/pdf",
                "doc.pdf",
            );
            let state = test_state(store.clone(), repo);

            let response = download(
                State(state),
                Identity("u1".to_string()),
                ValidatedJson(DownloadRequest {
                    file_store_id: record.id,
                    file_key: None,
                }),
            )
            .await
            .expect("owned record");

            assert_eq!(response.0.expires_in, 900);
            assert!(response.0.download_url.contains("attachments/files/u1/doc.pdf"));
        }
    }
}
