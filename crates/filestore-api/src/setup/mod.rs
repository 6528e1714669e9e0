//! Application setup and initialization
//!
//! Initialization logic extracted from main.rs for better organization and
//! testability.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::auth::verifier::{InMemoryKeyCache, TokenVerifier};
use crate::state::AppState;
use anyhow::{Context, Result};
use filestore_core::Config;
use filestore_db::FileStoreRepository;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let storage = storage::setup_storage(&config).await?;

    let verifier = Arc::new(TokenVerifier::new(
        config.auth_jwks_uri.clone(),
        config.auth_issuer.clone(),
        config.auth_audience.clone(),
        config.auth_client_id.clone(),
        Box::new(InMemoryKeyCache::default()),
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        files: Arc::new(FileStoreRepository::new(pool)),
        storage,
        verifier,
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
