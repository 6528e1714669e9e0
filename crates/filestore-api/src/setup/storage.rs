//! Object storage setup

use anyhow::{Context, Result};
use filestore_core::Config;
use filestore_storage::{ObjectStorage, S3Storage};
use std::sync::Arc;

/// Build the S3 storage client from configuration.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ObjectStorage>> {
    let storage = S3Storage::new(
        config.s3_bucket.clone(),
        config.s3_region.clone(),
        config.s3_endpoint.clone(),
    )
    .await
    .context("Failed to initialize object storage")?;

    tracing::info!(
        bucket = %config.s3_bucket,
        region = %config.s3_region,
        custom_endpoint = config.s3_endpoint.is_some(),
        "Object storage initialized"
    );

    Ok(Arc::new(storage))
}
