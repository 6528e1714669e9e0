//! S3 storage implementation

use crate::post_policy::{sign_post_policy, PostPolicyParams};
use crate::traits::{ObjectHead, ObjectStorage, PresignedPost, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::{ProvideCredentials, SharedCredentialsProvider};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use chrono::Utc;
use std::time::Duration;

/// S3-backed [`ObjectStorage`].
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    credentials_provider: Option<SharedCredentialsProvider>,
}

impl S3Storage {
    /// Create a new S3Storage instance.
    ///
    /// Credentials come from the default provider chain (environment,
    /// profile, instance role). `endpoint_url` switches to path-style
    /// addressing for S3-compatible providers such as MinIO.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        Ok(S3Storage {
            client,
            bucket,
            region,
            endpoint_url,
            credentials_provider: sdk_config.credentials_provider(),
        })
    }

    /// The URL a browser form posts to: path-style for custom endpoints,
    /// virtual-hosted-style for AWS.
    fn form_url(&self) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
        }
    }

    fn classify_sdk_error<E>(err: SdkError<E>, operation: &str) -> StorageError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        // A construction failure almost always means the credential chain
        // resolved nothing; everything else is a live backend fault.
        let detail = format!("{}: {}", operation, DisplayErrorContext(&err));
        if matches!(err, SdkError::ConstructionFailure(_)) {
            StorageError::NoCredentials(detail)
        } else {
            StorageError::BackendError(detail)
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn head(&self, key: &str) -> StorageResult<ObjectHead> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(head) => {
                let content_length = head.content_length().unwrap_or(0).max(0) as u64;
                Ok(ObjectHead { content_length })
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_not_found())
                    .unwrap_or(false)
                {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                tracing::error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    "S3 head failed"
                );
                Err(Self::classify_sdk_error(err, "head_object"))
            }
        }
    }

    async fn read_prefix(&self, key: &str, max_bytes: u64) -> StorageResult<Bytes> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes=0-{}", max_bytes.saturating_sub(1)))
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false)
                {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                tracing::error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    "S3 ranged get failed"
                );
                return Err(Self::classify_sdk_error(err, "get_object"));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::BackendError(format!("get_object body: {}", e)))?
            .into_bytes();

        Ok(bytes)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    "S3 delete failed"
                );
                Self::classify_sdk_error(err, "delete_object")
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );
        Ok(())
    }

    async fn presigned_download_url(
        &self,
        key: &str,
        content_type: &str,
        original_file_name: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::ConfigError(format!("presigning config: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_type(content_type)
            .response_content_disposition(format!(
                "inline; filename=\"{}\"",
                original_file_name.replace('"', "")
            ))
            .presigned(presigning)
            .await
            .map_err(|err| {
                tracing::error!(
                    error = %DisplayErrorContext(&err),
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to presign download URL"
                );
                Self::classify_sdk_error(err, "presign get_object")
            })?;

        Ok(request.uri().to_string())
    }

    async fn presigned_upload_post(
        &self,
        key: &str,
        max_size_bytes: u64,
        expires_in: Duration,
    ) -> StorageResult<PresignedPost> {
        let provider = self.credentials_provider.as_ref().ok_or_else(|| {
            StorageError::NoCredentials("no credentials provider configured".to_string())
        })?;
        let credentials = provider
            .provide_credentials()
            .await
            .map_err(|e| StorageError::NoCredentials(format!("credential resolution: {}", e)))?;

        let params = PostPolicyParams {
            bucket: &self.bucket,
            key,
            region: &self.region,
            content_length_range: (1, max_size_bytes),
            expires_in,
        };
        let post = sign_post_policy(&credentials, &params, self.form_url(), Utc::now());

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            max_size_bytes,
            expires_in_seconds = expires_in.as_secs(),
            "Generated presigned POST grant"
        );

        Ok(post)
    }
}
