//! File deletion.

use axum::{
    extract::{Path, State},
    Json,
};
use filestore_core::AppError;
use filestore_db::FileRepository as _;
use serde::Serialize;
use std::sync::Arc;

use crate::auth::Identity;
use crate::error::{translate_storage_error, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// DELETE /file/delete/{file_store_id}
///
/// Lookup is by id only, with no ownership filter: any authenticated caller
/// may delete any record. Storage object goes first, then the record; the
/// two deletions are not transactional, so a failed record deletion can
/// leave a record pointing at a removed object.
#[tracing::instrument(skip_all, fields(identity = %identity, file_store_id))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Identity(identity): Identity,
    Path(file_store_id): Path<i64>,
) -> Result<Json<DeleteResponse>, HttpAppError> {
    let record = state
        .files
        .find_by_id(file_store_id)
        .await?
        .ok_or_else(|| AppError::NotFound("file not found.".to_string()))?;

    state
        .storage
        .delete(&record.file_key)
        .await
        .map_err(|e| translate_storage_error(e, "could not delete file."))?;

    let removed = state.files.delete(record.id).await?;
    if !removed {
        // Concurrent delete won the race; the object is gone either way.
        tracing::debug!(file_store_id, "Record already deleted");
    }

    tracing::info!(
        identity = %identity,
        file_store_id,
        file_key = %record.file_key,
        owner = %record.user_id,
        "Deleted file"
    );

    Ok(Json(DeleteResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_response_shape() {
        let json = serde_json::to_value(DeleteResponse { success: true }).expect("serialize");
        assert_eq!(json, serde_json::json!({ "success": true }));
    }

    mod flow {
        use super::super::*;
        use crate::auth::Identity;
        use crate::state::test_support::test_state;
        use axum::extract::{Path, State};
        use filestore_db::test_helpers::InMemoryFileRepository;
        use filestore_storage::test_helpers::MockObjectStore;
        use std::sync::Arc;

        #[tokio::test]
        async fn missing_record_is_not_found_with_no_storage_calls() {
            let store = Arc::new(MockObjectStore::new());
            let repo = Arc::new(InMemoryFileRepository::new());
            let state = test_state(store.clone(), repo);

            let err = delete_file(State(state), Identity("u1".to_string()), Path(999))
                .await
                .expect_err("unknown id");

            assert_eq!(err.0.http_status_code(), 404);
            assert_eq!(err.0.client_message(), "file not found.");
            assert!(store.operations().is_empty());
        }

        #[tokio::test]
        async fn removes_object_then_record() {
            let store = Arc::new(MockObjectStore::new());
            let key = "attachments/files/u1/gone.jpg";
            store.put_object(key, vec![1, 2, 3]);
            let repo = Arc::new(InMemoryFileRepository::new());
            let record = repo.seed("u1", key, "photo", "image/jpeg", "gone.jpg");
            let state = test_state(store.clone(), repo.clone());

            let response = delete_file(State(state), Identity("u1".to_string()), Path(record.id))
                .await
                .expect("existing record");

            assert!(response.0.success);
            assert!(!store.has_object(key));
            assert_eq!(repo.count(), 0);
        }
    }
}
