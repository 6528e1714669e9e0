//! Bearer-token authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use filestore_core::AppError;
use std::sync::Arc;

use crate::auth::Identity;
use crate::error::HttpAppError;
use crate::state::AppState;

/// Require a valid bearer token on every request passing through. On
/// success, the caller's identity is attached as a request extension.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpAppError> {
    let token = bearer_token(&request).ok_or_else(|| {
        HttpAppError(AppError::Unauthorized(
            "Missing or malformed Authorization header".to_string(),
        ))
    })?;

    let identity = state.verifier.verify(&token).await?;

    request.extensions_mut().insert(Identity(identity));

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;

    let token = header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}
