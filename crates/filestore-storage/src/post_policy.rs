//! SigV4 browser POST policy signing.
//!
//! The AWS Rust SDK presigns individual requests but has no equivalent of
//! `generate_presigned_post`, so the policy document and its signature are
//! built here. The output matches what S3 expects from an HTML form upload:
//! a base64 policy plus the `x-amz-*` fields, signed with the
//! AWS4-HMAC-SHA256 key derivation.

use crate::traits::PresignedPost;
use aws_sdk_s3::config::Credentials;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::time::Duration;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVER_SIDE_ENCRYPTION: &str = "AES256";

/// What the policy constrains. `content_length_range` is inclusive on both
/// ends; the lower bound of 1 rejects empty uploads.
#[derive(Debug, Clone)]
pub struct PostPolicyParams<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub region: &'a str,
    pub content_length_range: (u64, u64),
    pub expires_in: Duration,
}

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// AWS4 signing key derivation: date, region, service, terminator.
fn signing_key(secret: &str, date: &str, region: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, b"s3");
    hmac_sha256(&k_service, b"aws4_request")
}

/// Build and sign a POST policy. `now` is a parameter so signing is
/// deterministic under test; production callers pass `Utc::now()`.
pub fn sign_post_policy(
    credentials: &Credentials,
    params: &PostPolicyParams<'_>,
    form_url: String,
    now: DateTime<Utc>,
) -> PresignedPost {
    let date_stamp = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let credential_scope = format!(
        "{}/{}/{}/s3/aws4_request",
        credentials.access_key_id(),
        date_stamp,
        params.region
    );
    let expiration = (now + ChronoDuration::from_std(params.expires_in)
        .unwrap_or_else(|_| ChronoDuration::seconds(900)))
    .format("%Y-%m-%dT%H:%M:%S%.3fZ")
    .to_string();

    let (min_size, max_size) = params.content_length_range;
    let mut conditions = vec![
        json!({ "bucket": params.bucket }),
        json!({ "key": params.key }),
        json!(["content-length-range", min_size, max_size]),
        json!({ "x-amz-server-side-encryption": SERVER_SIDE_ENCRYPTION }),
        json!({ "x-amz-algorithm": ALGORITHM }),
        json!({ "x-amz-credential": credential_scope }),
        json!({ "x-amz-date": amz_date }),
    ];
    if let Some(token) = credentials.session_token() {
        conditions.push(json!({ "x-amz-security-token": token }));
    }

    let policy = json!({
        "expiration": expiration,
        "conditions": conditions,
    });
    let policy_b64 = BASE64.encode(policy.to_string());

    let key = signing_key(
        credentials.secret_access_key(),
        &date_stamp,
        params.region,
    );
    let signature = hex::encode(hmac_sha256(&key, policy_b64.as_bytes()));

    let mut fields = serde_json::Map::new();
    fields.insert("key".into(), json!(params.key));
    fields.insert(
        "x-amz-server-side-encryption".into(),
        json!(SERVER_SIDE_ENCRYPTION),
    );
    fields.insert("x-amz-algorithm".into(), json!(ALGORITHM));
    fields.insert("x-amz-credential".into(), json!(credential_scope));
    fields.insert("x-amz-date".into(), json!(amz_date));
    if let Some(token) = credentials.session_token() {
        fields.insert("x-amz-security-token".into(), json!(token));
    }
    fields.insert("policy".into(), json!(policy_b64));
    fields.insert("x-amz-signature".into(), json!(signature));

    PresignedPost {
        url: form_url,
        fields: serde_json::Value::Object(fields),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_credentials() -> Credentials {
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", None, None, "test")
    }

    fn test_params() -> PostPolicyParams<'static> {
        PostPolicyParams {
            bucket: "user-files",
            key: "attachments/files/u1/abc.jpg",
            region: "us-east-1",
            content_length_range: (1, 10_485_760),
            expires_in: Duration::from_secs(900),
        }
    }

    #[test]
    fn policy_document_carries_the_constraints() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let post = sign_post_policy(
            &test_credentials(),
            &test_params(),
            "https://user-files.s3.us-east-1.amazonaws.com".to_string(),
            now,
        );

        let policy_b64 = post.fields["policy"].as_str().unwrap();
        let decoded = BASE64.decode(policy_b64).unwrap();
        let policy: serde_json::Value = serde_json::from_slice(&decoded).unwrap();

        let conditions = policy["conditions"].as_array().unwrap();
        assert!(conditions.contains(&json!(["content-length-range", 1, 10_485_760])));
        assert!(conditions.contains(&json!({ "bucket": "user-files" })));
        assert!(conditions.contains(&json!({ "x-amz-server-side-encryption": "AES256" })));
        assert_eq!(policy["expiration"], "2024-05-01T12:15:00.000Z");
    }

    #[test]
    fn fields_are_complete_and_signature_is_hex() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let post = sign_post_policy(
            &test_credentials(),
            &test_params(),
            "https://user-files.s3.us-east-1.amazonaws.com".to_string(),
            now,
        );

        assert_eq!(post.fields["key"], "attachments/files/u1/abc.jpg");
        assert_eq!(post.fields["x-amz-algorithm"], "AWS4-HMAC-SHA256");
        assert_eq!(
            post.fields["x-amz-credential"],
            "AKIDEXAMPLE/20240501/us-east-1/s3/aws4_request"
        );
        assert_eq!(post.fields["x-amz-date"], "20240501T120000Z");
        assert_eq!(post.fields["x-amz-server-side-encryption"], "AES256");

        let signature = post.fields["x-amz-signature"].as_str().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signing_is_deterministic_for_fixed_inputs() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let url = "https://user-files.s3.us-east-1.amazonaws.com".to_string();
        let a = sign_post_policy(&test_credentials(), &test_params(), url.clone(), now);
        let b = sign_post_policy(&test_credentials(), &test_params(), url, now);
        assert_eq!(a.fields, b.fields);
    }

    #[test]
    fn session_token_is_included_when_present() {
        let credentials = Credentials::new(
            "AKIDEXAMPLE",
            "secret",
            Some("the-session-token".to_string()),
            None,
            "test",
        );
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let post = sign_post_policy(
            &credentials,
            &test_params(),
            "https://example".to_string(),
            now,
        );
        assert_eq!(post.fields["x-amz-security-token"], "the-session-token");
    }
}
