//! Configuration module
//!
//! Environment-driven configuration for the filestore service. Everything the
//! service needs is read once at startup via [`Config::from_env`] and
//! validated with [`Config::validate`] before any connection is opened.

use std::env;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 900;
const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,

    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    // Object storage
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO etc.); None for AWS.
    pub s3_endpoint: Option<String>,
    pub presign_expiry_seconds: u64,

    // Upload constraints
    pub max_file_size_bytes: u64,
    pub allowed_file_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,

    // Identity verification
    pub auth_jwks_uri: String,
    pub auth_issuer: String,
    pub auth_audience: String,
    pub auth_client_id: String,
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

        Ok(Config {
            server_port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            cors_origins: parse_list(&cors_origins_str),
            environment,

            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DB_TIMEOUT_SECS),

            s3_bucket: env::var("S3_BUCKET_NAME")
                .map_err(|_| anyhow::anyhow!("S3_BUCKET_NAME must be set"))?,
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            presign_expiry_seconds: env::var("PRESIGNED_URL_EXPIRATION_TIME")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PRESIGN_EXPIRY_SECS),

            max_file_size_bytes: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES),
            allowed_file_extensions: parse_list(
                &env::var("ALLOWED_FILE_EXTENSIONS")
                    .unwrap_or_else(|_| "jpg,jpeg,png,pdf".to_string()),
            ),
            allowed_content_types: parse_list(&env::var("ALLOWED_FILE_TYPES").unwrap_or_else(
                |_| "image/jpeg,image/png,application/pdf".to_string(),
            )),

            auth_jwks_uri: env::var("AUTH_JWKS_URI")
                .map_err(|_| anyhow::anyhow!("AUTH_JWKS_URI must be set"))?,
            auth_issuer: env::var("AUTH_ISSUER")
                .map_err(|_| anyhow::anyhow!("AUTH_ISSUER must be set"))?,
            auth_audience: env::var("AUTH_AUDIENCE")
                .map_err(|_| anyhow::anyhow!("AUTH_AUDIENCE must be set"))?,
            auth_client_id: env::var("AUTH_CLIENT_ID")
                .map_err(|_| anyhow::anyhow!("AUTH_CLIENT_ID must be set"))?,
        })
    }

    /// Fail fast on configuration that would only blow up mid-request.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE must be greater than zero");
        }
        if self.presign_expiry_seconds == 0 {
            anyhow::bail!("PRESIGNED_URL_EXPIRATION_TIME must be greater than zero");
        }
        if self.allowed_file_extensions.is_empty() {
            anyhow::bail!("ALLOWED_FILE_EXTENSIONS must not be empty");
        }
        if self.allowed_content_types.is_empty() {
            anyhow::bail!("ALLOWED_FILE_TYPES must not be empty");
        }
        if self.s3_bucket.is_empty() {
            anyhow::bail!("S3_BUCKET_NAME must not be empty");
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }
}
