//! Upload grant issuance and post-upload registration.

use axum::{extract::State, Json};
use filestore_core::{keys, AppError};
use filestore_db::FileRepository as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Identity;
use crate::error::{translate_storage_error, HttpAppError, ValidatedJson};
use crate::services::upload_validation::inspect_uploaded_object;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadUrlRequest {
    pub file_name: String,
}

/// The storage key travels inside `fields["key"]`; clients echo it back in
/// the registration request.
#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub success: bool,
    pub upload_url: String,
    pub fields: Value,
}

/// POST /file/generate_file_upload_url
///
/// Issues a time-limited, form-based upload grant for a fresh key inside the
/// caller's namespace. The grant itself bounds the object's size; content is
/// only checked after the upload, in [`post_upload_validation`].
#[tracing::instrument(
    skip_all,
    fields(identity = %identity, file_name = %request.file_name)
)]
pub async fn generate_file_upload_url(
    State(state): State<Arc<AppState>>,
    Identity(identity): Identity,
    ValidatedJson(request): ValidatedJson<UploadUrlRequest>,
) -> Result<Json<UploadUrlResponse>, HttpAppError> {
    let extension = accepted_extension(&request.file_name, &state.config.allowed_file_extensions)?;

    let file_key = keys::generate_file_key(&identity, &extension);

    let grant = state
        .storage
        .presigned_upload_post(
            &file_key,
            state.config.max_file_size_bytes,
            Duration::from_secs(state.config.presign_expiry_seconds),
        )
        .await
        .map_err(|e| translate_storage_error(e, "could not generate upload link."))?;

    tracing::info!(
        identity = %identity,
        file_key = %file_key,
        expires_in = state.config.presign_expiry_seconds,
        "Issued upload grant"
    );

    Ok(Json(UploadUrlResponse {
        success: true,
        upload_url: grant.url,
        fields: grant.fields,
    }))
}

/// Validate the claimed filename and return its lowercased extension.
fn accepted_extension(file_name: &str, allowed: &[String]) -> Result<String, AppError> {
    if file_name.trim().is_empty() {
        return Err(AppError::InvalidInput("filename cannot be empty.".to_string()));
    }

    keys::extension_of(file_name)
        .filter(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .map(|ext| ext.to_lowercase())
        .ok_or_else(|| AppError::InvalidInput("file type not accepted.".to_string()))
}

#[derive(Debug, Deserialize)]
pub struct PostUploadRequest {
    pub file_key: String,
    pub file_category: String,
    pub original_file_name: String,
}

#[derive(Debug, Serialize)]
pub struct PostUploadResponse {
    pub message: String,
}

/// POST /file/post_upload_validation
///
/// Validates a claimed upload and registers it. The pre-insert duplicate
/// check gives the friendly "already added" answer; the unique index on
/// `file_key` catches the concurrent race the check cannot see.
#[tracing::instrument(
    skip_all,
    fields(identity = %identity, file_key = %request.file_key)
)]
pub async fn post_upload_validation(
    State(state): State<Arc<AppState>>,
    Identity(identity): Identity,
    ValidatedJson(request): ValidatedJson<PostUploadRequest>,
) -> Result<Json<PostUploadResponse>, HttpAppError> {
    let content_type = inspect_uploaded_object(
        state.storage.as_ref(),
        state.config.max_file_size_bytes,
        &state.config.allowed_content_types,
        &identity,
        &request.file_key,
    )
    .await?;

    if state
        .files
        .find_by_owner_and_key(&identity, &request.file_key)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("File already added.".to_string()).into());
    }

    let record = state
        .files
        .insert(
            &identity,
            &request.file_key,
            &request.file_category,
            &content_type,
            &request.original_file_name,
        )
        .await?;

    tracing::info!(
        identity = %identity,
        file_key = %request.file_key,
        file_store_id = record.id,
        content_type = %content_type,
        "Registered upload"
    );

    Ok(Json(PostUploadResponse {
        message: "successfully added attachment.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allow_list() -> Vec<String> {
        vec!["jpg".to_string(), "png".to_string()]
    }

    #[test]
    fn empty_filename_is_rejected() {
        let err = accepted_extension("", &allow_list()).expect_err("empty name");
        assert_eq!(err.client_message(), "filename cannot be empty.");

        let err = accepted_extension("   ", &allow_list()).expect_err("blank name");
        assert_eq!(err.client_message(), "filename cannot be empty.");
    }

    #[test]
    fn disallowed_extension_is_rejected() {
        let err = accepted_extension("a.exe", &allow_list()).expect_err("exe");
        assert_eq!(err.client_message(), "file type not accepted.");
        assert_eq!(err.http_status_code(), 400);

        assert!(accepted_extension("no_extension", &allow_list()).is_err());
    }

    #[test]
    fn accepted_extension_is_lowercased() {
        assert_eq!(accepted_extension("Photo.JPG", &allow_list()).unwrap(), "jpg");
        assert_eq!(accepted_extension("a.png", &allow_list()).unwrap(), "png");
    }

    #[test]
    fn upload_url_request_parses() {
        let request: UploadUrlRequest =
            serde_json::from_str(r#"{"file_name": "photo.jpg"}"#).expect("parse");
        assert_eq!(request.file_name, "photo.jpg");
    }

    #[test]
    fn post_upload_request_requires_all_fields() {
        let result = serde_json::from_str::<PostUploadRequest>(
            r#"{"file_key": "attachments/files/u1/x.jpg", "file_category": "avatar"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn upload_url_response_shape() {
        let response = UploadUrlResponse {
            success: true,
            upload_url: "https://bucket.s3.amazonaws.com".to_string(),
            fields: serde_json::json!({ "key": "attachments/files/u1/x.jpg" }),
        };
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["fields"]["key"], "attachments/files/u1/x.jpg");
        // The key travels in the form fields only
        assert!(json.get("file_key").is_none());
    }

    mod registration {
        use super::super::*;
        use crate::auth::Identity;
        use crate::error::ValidatedJson;
        use crate::state::test_support::test_state;
        use axum::extract::State;
        use filestore_db::test_helpers::InMemoryFileRepository;
        use filestore_db::FileRepository;
        use filestore_storage::test_helpers::MockObjectStore;
        use std::sync::Arc;

        const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        const KEY: &str = "attachments/files/u1/abc.png";

        fn claim(file_key: &str) -> PostUploadRequest {
            PostUploadRequest {
                file_key: file_key.to_string(),
                file_category: "avatar".to_string(),
                original_file_name: "abc.png".to_string(),
            }
        }

        #[tokio::test]
        async fn valid_claim_registers_exactly_one_record() {
            let store = Arc::new(MockObjectStore::new());
            store.put_object(KEY, PNG_MAGIC.to_vec());
            let repo = Arc::new(InMemoryFileRepository::new());
            let state = test_state(store.clone(), repo.clone());

            let response = post_upload_validation(
                State(state),
                Identity("u1".to_string()),
                ValidatedJson(claim(KEY)),
            )
            .await
            .expect("valid claim");

            assert_eq!(response.0.message, "successfully added attachment.");
            assert_eq!(repo.count(), 1);
            let record = repo.find_by_owner_and_key("u1", KEY).await.unwrap().unwrap();
            assert_eq!(record.file_content_type, "image/png");
        }

        #[tokio::test]
        async fn already_registered_key_is_rejected_before_insert() {
            let store = Arc::new(MockObjectStore::new());
            store.put_object(KEY, PNG_MAGIC.to_vec());
            let repo = Arc::new(InMemoryFileRepository::new());
            repo.seed("u1", KEY, "avatar", "image/png", "abc.png");
            let state = test_state(store.clone(), repo.clone());

            let err = post_upload_validation(
                State(state),
                Identity("u1".to_string()),
                ValidatedJson(claim(KEY)),
            )
            .await
            .expect_err("duplicate claim");

            assert_eq!(err.0.client_message(), "File already added.");
            assert_eq!(err.0.http_status_code(), 409);
            assert_eq!(repo.count(), 1);
        }

        #[tokio::test]
        async fn lost_insert_race_is_a_conflict_with_one_row() {
            let store = Arc::new(MockObjectStore::new());
            store.put_object(KEY, PNG_MAGIC.to_vec());
            let repo = Arc::new(InMemoryFileRepository::new());
            // Same key already registered under another identity: the
            // pre-check misses it, the unique index does not.
            repo.seed("u2", KEY, "avatar", "image/png", "abc.png");
            let state = test_state(store.clone(), repo.clone());

            let err = post_upload_validation(
                State(state),
                Identity("u1".to_string()),
                ValidatedJson(claim(KEY)),
            )
            .await
            .expect_err("unique violation");

            assert_eq!(err.0.client_message(), "File already registered.");
            assert_eq!(repo.count(), 1);
        }
    }
}
