//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Domain errors
//! are translated to `AppError` at the boundary of the component that
//! produced them (with the original cause logged there); this module only
//! renders the client-safe message and status.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use filestore_core::{AppError, LogLevel};
use filestore_storage::StorageError;
use serde::de::DeserializeOwned;

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper type for AppError to implement IntoResponse. Needed because of
/// the orphan rule: AppError lives in filestore-core.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

/// Convert JSON body deserialization failures into a 400 with our
/// ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON)
/// on deserialization failure, instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

/// Translate a storage-layer failure into an AppError, logging the backend
/// detail here so it never reaches the client. `client_message` is what the
/// caller is allowed to see for generic backend faults.
pub fn translate_storage_error(err: StorageError, client_message: &str) -> AppError {
    match err {
        StorageError::NotFound(key) => {
            tracing::debug!(key = %key, "Object not found in storage");
            AppError::NotFound("file not found.".to_string())
        }
        StorageError::NoCredentials(detail) => {
            tracing::error!(error = %detail, "Storage credentials unavailable");
            AppError::StorageUnavailable(detail)
        }
        StorageError::ConfigError(detail) => {
            tracing::error!(error = %detail, "Storage misconfigured");
            AppError::Storage("internal configuration error.".to_string())
        }
        StorageError::BackendError(detail) => {
            tracing::error!(error = %detail, "Storage backend failure");
            AppError::Storage(client_message.to_string())
        }
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, code = error.error_code(), "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, code = error.error_code(), "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, code = error.error_code(), "Request failed");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let body = Json(ErrorResponse {
            error: app_error.client_message(),
        });

        (status, body).into_response()
    }
}
