//! Application state shared by all handlers.

use crate::auth::verifier::TokenVerifier;
use filestore_core::Config;
use filestore_db::FileRepository;
use filestore_storage::ObjectStorage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub files: Arc<dyn FileRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub verifier: Arc<TokenVerifier>,
}
