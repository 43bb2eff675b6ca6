//! Image host client
//!
//! Uploaded artwork is stored by a third-party image host, which also returns
//! auto-generated tags. Handlers only see the [`ImageHost`] trait so tests can
//! swap in a stub.

use async_trait::async_trait;
use gallery_common::config::{ImageHostConfig, SignatureAlgorithm};
use serde::Deserialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

const UPLOAD_BASE_URL: &str = "https://api.cloudinary.com/v1_1";
const USER_AGENT: &str = concat!("gallery-api/", env!("CARGO_PKG_VERSION"));
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Signing error: {0}")]
    Signing(String),
}

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    /// Public HTTPS URL of the stored image
    pub url: String,
    /// Auto-tags above the configured confidence threshold
    pub tags: Vec<String>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: Vec<u8>) -> Result<UploadedImage, ImageHostError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Signed-upload client for Cloudinary
pub struct CloudinaryClient {
    http_client: reqwest::Client,
    config: ImageHostConfig,
}

impl CloudinaryClient {
    pub fn new(config: ImageHostConfig) -> Result<Self, ImageHostError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| ImageHostError::Network(e.to_string()))?;

        Ok(Self { http_client, config })
    }

    fn upload_url(&self) -> String {
        format!("{}/{}/image/upload", UPLOAD_BASE_URL, self.config.cloud_name)
    }

    /// Parameters covered by the signature, sorted by name
    fn signed_params(&self, public_id: &str, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("auto_tagging", self.config.auto_tagging.to_string()),
            ("categorization", self.config.categorization.clone()),
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }
}

/// `k1=v1&k2=v2` over params already in name order
pub fn string_to_sign(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Lowercase hex digest of `payload` followed by `secret`
pub fn sign(payload: &str, secret: &str, algorithm: SignatureAlgorithm) -> String {
    let input = format!("{}{}", payload, secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => format!("{:x}", Sha1::digest(input.as_bytes())),
        SignatureAlgorithm::Sha256 => format!("{:x}", Sha256::digest(input.as_bytes())),
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload(&self, image: Vec<u8>) -> Result<UploadedImage, ImageHostError> {
        let public_id = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp();

        let params = self.signed_params(&public_id, timestamp);
        let signature = sign(
            &string_to_sign(&params),
            &self.config.api_secret,
            self.config.signature_algorithm,
        );
        let signature_algorithm = match self.config.signature_algorithm {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        };

        let file = reqwest::multipart::Part::bytes(image)
            .file_name(public_id.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| ImageHostError::Signing(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", file)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", signature_algorithm);
        for (name, value) in params {
            form = form.text(name, value);
        }

        tracing::debug!(public_id = %public_id, "Uploading image");

        let response = self
            .http_client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageHostError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ImageHostError::Api(status.as_u16(), error_text));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ImageHostError::Parse(e.to_string()))?;

        let url = body
            .secure_url
            .ok_or_else(|| ImageHostError::Parse("response has no secure_url".to_string()))?;

        tracing::info!(public_id = %public_id, tags = body.tags.len(), "Image uploaded");

        Ok(UploadedImage { url, tags: body.tags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImageHostConfig {
        ImageHostConfig {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            signature_algorithm: SignatureAlgorithm::Sha1,
            auto_tagging: 0.6,
            categorization: "google_tagging".to_string(),
        }
    }

    #[test]
    fn test_digests() {
        // "ab" + "c" hashes the standard "abc" vectors
        assert_eq!(
            sign("ab", "c", SignatureAlgorithm::Sha1),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(
            sign("ab", "c", SignatureAlgorithm::Sha256),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_string_to_sign_is_sorted() {
        let client = CloudinaryClient::new(config()).unwrap();
        let params = client.signed_params("abc123", 1315060510);
        assert_eq!(
            string_to_sign(&params),
            "auto_tagging=0.6&categorization=google_tagging&public_id=abc123&timestamp=1315060510"
        );
    }

    #[test]
    fn test_upload_url() {
        let client = CloudinaryClient::new(config()).unwrap();
        assert_eq!(
            client.upload_url(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_response_without_tags() {
        let body: UploadResponse =
            serde_json::from_str(r#"{"secure_url": "https://res.example/x.png"}"#).unwrap();
        assert!(body.tags.is_empty());
        assert_eq!(body.secure_url.as_deref(), Some("https://res.example/x.png"));
    }
}
