//! Pinata pinning client
//!
//! Uploads files and JSON documents to IPFS through Pinata's pinning API and
//! reads content back through a public gateway.

use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use crate::domain::{Attachment, ContentId};
use crate::infra::{AuthodoxError, ContentStore, Result};

const DEFAULT_GATEWAY: &str = "gateway.pinata.cloud";
const DEFAULT_API_URL: &str = "https://api.pinata.cloud";

/// Pinata client configuration
#[derive(Clone)]
pub struct PinataConfig {
    /// JWT used as bearer token for the pinning API
    pub jwt: Option<String>,
    /// Gateway host or base URL used for reads
    pub gateway: String,
    /// Pinning API base URL
    pub api_url: String,
}

impl std::fmt::Debug for PinataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataConfig")
            .field("jwt", &self.jwt.as_ref().map(|_| "<redacted>"))
            .field("gateway", &self.gateway)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Default for PinataConfig {
    fn default() -> Self {
        Self {
            jwt: None,
            gateway: DEFAULT_GATEWAY.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl PinataConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: std::env::var("PINATA_JWT").ok().filter(|s| !s.is_empty()),
            gateway: std::env::var("PINATA_GATEWAY")
                .unwrap_or_else(|_| DEFAULT_GATEWAY.to_string()),
            api_url: std::env::var("PINATA_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        }
    }

    /// Gateway base ending in `/ipfs/`, accepting a bare host or a full URL
    pub fn gateway_base(&self) -> String {
        let gateway = self.gateway.trim().trim_end_matches('/');
        let with_scheme = if gateway.starts_with("http://") || gateway.starts_with("https://") {
            gateway.to_string()
        } else {
            format!("https://{gateway}")
        };

        if with_scheme.ends_with("/ipfs") {
            format!("{with_scheme}/")
        } else {
            format!("{with_scheme}/ipfs/")
        }
    }

    pub fn key_status(&self) -> KeyStatus {
        KeyStatus::check(self.jwt.as_deref())
    }
}

/// Sanity check of the configured pinning credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    /// `PINATA_JWT` is not set
    Missing,
    /// Too short to be a JWT; probably the API key was configured instead
    TooShort,
    /// Does not start with the JWT header prefix `eyJ`
    NotJwt,
    Valid,
}

impl KeyStatus {
    const MIN_JWT_LEN: usize = 100;

    pub fn check(jwt: Option<&str>) -> Self {
        match jwt {
            None => KeyStatus::Missing,
            Some(key) if key.is_empty() => KeyStatus::Missing,
            Some(key) if key.len() < Self::MIN_JWT_LEN => KeyStatus::TooShort,
            Some(key) if !key.starts_with("eyJ") => KeyStatus::NotJwt,
            Some(_) => KeyStatus::Valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, KeyStatus::Valid)
    }

    pub fn message(&self) -> &'static str {
        match self {
            KeyStatus::Missing => "PINATA_JWT is not set",
            KeyStatus::TooShort => "PINATA_JWT is too short; it is probably the API key, not the JWT",
            KeyStatus::NotJwt => "PINATA_JWT does not look like a JWT (expected it to start with 'eyJ')",
            KeyStatus::Valid => "PINATA_JWT is set and looks like a valid JWT",
        }
    }
}

/// Response of the pinning endpoints
#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Pinata-backed [`ContentStore`]
pub struct PinataContentStore {
    config: PinataConfig,
    client: reqwest::Client,
}

impl PinataContentStore {
    pub fn new(config: PinataConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &PinataConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn bearer(&self) -> Result<&str> {
        self.config
            .jwt
            .as_deref()
            .ok_or_else(|| AuthodoxError::UploadFailure("PINATA_JWT is not set".to_string()))
    }

    async fn read_pin_response(response: reqwest::Response) -> Result<ContentId> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthodoxError::UploadFailure(format!(
                "pinning service returned {status}: {body}"
            )));
        }

        let pin: PinResponse = response
            .json()
            .await
            .map_err(|e| AuthodoxError::UploadFailure(format!("invalid pin response: {e}")))?;

        Ok(ContentId::from(pin.ipfs_hash))
    }
}

#[async_trait]
impl ContentStore for PinataContentStore {
    async fn upload_file(&self, file: &Attachment) -> Result<ContentId> {
        let start = Instant::now();

        let mut part = multipart::Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        if let Some(content_type) = &file.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| AuthodoxError::InvalidInput(format!("invalid content type: {e}")))?;
        }
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("pinning/pinFileToIPFS"))
            .bearer_auth(self.bearer()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AuthodoxError::UploadFailure(e.to_string()))?;

        let id = Self::read_pin_response(response).await?;
        info!(
            file_name = %file.name,
            bytes = file.len(),
            content_id = %id,
            "Uploaded file to IPFS in {:?}",
            start.elapsed()
        );
        Ok(id)
    }

    async fn upload_json(&self, document: &serde_json::Value) -> Result<ContentId> {
        let start = Instant::now();

        let response = self
            .client
            .post(self.endpoint("pinning/pinJSONToIPFS"))
            .bearer_auth(self.bearer()?)
            .json(&serde_json::json!({ "pinataContent": document }))
            .send()
            .await
            .map_err(|e| AuthodoxError::UploadFailure(e.to_string()))?;

        let id = Self::read_pin_response(response).await?;
        info!(content_id = %id, "Uploaded JSON to IPFS in {:?}", start.elapsed());
        Ok(id)
    }

    async fn fetch(&self, id: &ContentId) -> Result<Vec<u8>> {
        let url = self.gateway_url(id.as_str());
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthodoxError::ReadFailure(format!("gateway request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AuthodoxError::NotFound(format!("content {id}")));
        }
        if !status.is_success() {
            return Err(AuthodoxError::ReadFailure(format!(
                "gateway returned {status} for {id}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthodoxError::ReadFailure(format!("gateway read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn gateway_url(&self, id: &str) -> String {
        format!("{}{}", self.config.gateway_base(), id)
    }
}
