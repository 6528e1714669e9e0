//! RS256 JWT verification against a JWKS endpoint
//!
//! Tokens are verified with the issuer's public keys, fetched from the
//! JWKS endpoint on first use. Signing keys are immutable once published
//! under a given `kid`, so cached entries never expire; an unknown `kid`
//! triggers a refetch.

use filestore_core::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure (RSA only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "use")]
    pub key_use: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>,
    #[serde(rename = "e")]
    pub exponent: Option<String>,
}

/// Claims we care about. `azp` carries the authorized party (the client id
/// the token was issued to) and must match our configured client.
#[derive(Debug, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub azp: Option<String>,
}

/// Storage for fetched signing keys, keyed by `kid`.
///
/// Abstracted behind a trait so deployments can share keys across instances
/// (e.g. a Redis-backed cache) without touching verification logic.
pub trait KeyCache: Send + Sync {
    fn get(&self, kid: &str) -> Option<Jwk>;
    fn set(&self, kid: &str, jwk: Jwk);
}

/// Process-local key cache. Sufficient for a single instance; keys are
/// fetched once per `kid` for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryKeyCache {
    keys: RwLock<HashMap<String, Jwk>>,
}

impl KeyCache for InMemoryKeyCache {
    fn get(&self, kid: &str) -> Option<Jwk> {
        self.keys.read().ok()?.get(kid).cloned()
    }

    fn set(&self, kid: &str, jwk: Jwk) {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(kid.to_string(), jwk);
        }
    }
}

/// Verifies bearer tokens and extracts the caller's identity.
pub struct TokenVerifier {
    jwks_uri: String,
    issuer: String,
    audience: String,
    client_id: String,
    cache: Box<dyn KeyCache>,
    http: reqwest::Client,
}

impl TokenVerifier {
    pub fn new(
        jwks_uri: String,
        issuer: String,
        audience: String,
        client_id: String,
        cache: Box<dyn KeyCache>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            jwks_uri,
            issuer,
            audience,
            client_id,
            cache,
            http,
        }
    }

    /// Fetch JWKS from the configured URI
    async fn fetch_jwks(&self) -> Result<Jwks, AppError> {
        let response = self
            .http
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "JWKS endpoint returned error: {}",
                response.status()
            )));
        }

        response
            .json::<Jwks>()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Failed to parse JWKS: {}", e)))
    }

    /// Look up the signing key for `kid`, fetching the key set on cache miss.
    async fn resolve_key(&self, kid: &str) -> Result<Jwk, AppError> {
        if let Some(jwk) = self.cache.get(kid) {
            return Ok(jwk);
        }

        tracing::debug!(kid = %kid, "Signing key not cached, fetching JWKS");
        let jwks = self.fetch_jwks().await?;

        for jwk in &jwks.keys {
            if let Some(id) = &jwk.key_id {
                self.cache.set(id, jwk.clone());
            }
        }

        self.cache
            .get(kid)
            .ok_or_else(|| AppError::Unauthorized(format!("No signing key found for kid: {}", kid)))
    }

    fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AppError> {
        if jwk.key_type != "RSA" {
            return Err(AppError::Unauthorized(format!(
                "Unsupported key type: {}",
                jwk.key_type
            )));
        }

        let n = jwk
            .modulus
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing modulus".to_string()))?;
        let e = jwk
            .exponent
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("RSA key missing exponent".to_string()))?;

        DecodingKey::from_rsa_components(n, e)
            .map_err(|e| AppError::Unauthorized(format!("Failed to create RSA key: {}", e)))
    }

    /// Verify a bearer token and return the caller's identity.
    ///
    /// Checks signature, issuer, audience and authorized party. Expiration
    /// is not enforced here: the issued grants are themselves short-lived,
    /// and upstream infrastructure handles token lifetime.
    pub async fn verify(&self, token: &str) -> Result<String, AppError> {
        let header = decode_header(token)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Unauthorized(format!(
                "Unsupported algorithm: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Unauthorized("Token header missing kid".to_string()))?;

        let jwk = self.resolve_key(&kid).await?;
        let key = Self::decoding_key(&jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["iss", "aud", "sub"]);

        let token_data = decode::<TokenClaims>(token, &key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Token validation failed: {}", e)))?;

        let claims = token_data.claims;

        match &claims.azp {
            Some(azp) if azp == &self.client_id => {}
            _ => {
                return Err(AppError::Unauthorized(
                    "Token not issued to this client".to_string(),
                ));
            }
        }

        subject_identity(&claims.sub)
    }
}

/// Extract the provider-local identity from a `provider|identity` subject.
pub fn subject_identity(sub: &str) -> Result<String, AppError> {
    match sub.split('|').nth(1) {
        Some(identity) if !identity.is_empty() => Ok(identity.to_string()),
        _ => Err(AppError::Unauthorized(format!(
            "Malformed subject claim: {}",
            sub
        ))),
    }
}
