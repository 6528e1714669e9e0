pub mod middleware;
pub mod verifier;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use filestore_core::AppError;

use crate::error::HttpAppError;

/// The namespace-local identity of the authenticated caller, extracted from
/// the verified token's subject. Inserted as a request extension by the auth
/// middleware; handlers receive it as an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            HttpAppError(AppError::Unauthorized(
                "identity missing from request extensions".to_string(),
            ))
        })
    }
}
