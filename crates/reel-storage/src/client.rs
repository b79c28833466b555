//! Edge storage client implementation.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

/// Default storage API endpoint.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.bunnycdn.com";

/// Configuration for the edge storage client.
#[derive(Clone)]
pub struct EdgeStorageConfig {
    /// Storage API endpoint (e.g. `https://storage.bunnycdn.com`)
    pub storage_endpoint: String,
    /// Storage zone name
    pub zone_name: String,
    /// Zone access key, sent as the `AccessKey` header
    pub api_key: String,
    /// Public CDN base URL serving the zone
    pub cdn_endpoint: String,
    /// Optional folder prepended to every remote path
    pub remote_prefix: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for EdgeStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeStorageConfig")
            .field("storage_endpoint", &self.storage_endpoint)
            .field("zone_name", &self.zone_name)
            .field("api_key", &"<redacted>")
            .field("cdn_endpoint", &self.cdn_endpoint)
            .field("remote_prefix", &self.remote_prefix)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EdgeStorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            storage_endpoint: std::env::var("STORAGE_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_STORAGE_ENDPOINT.to_string()),
            zone_name: std::env::var("STORAGE_ZONE_NAME")
                .map_err(|_| StorageError::config_error("STORAGE_ZONE_NAME not set"))?,
            api_key: std::env::var("API_KEY")
                .map_err(|_| StorageError::config_error("API_KEY not set"))?,
            cdn_endpoint: std::env::var("CDN_ENDPOINT")
                .map_err(|_| StorageError::config_error("CDN_ENDPOINT not set"))?,
            remote_prefix: std::env::var("STORAGE_REMOTE_PREFIX")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            timeout: Duration::from_secs(
                std::env::var("STORAGE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        })
    }

    /// Remote path for a local file: optional prefix plus the file name.
    pub fn remote_path_for(&self, path: &Path) -> StorageResult<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;

        Ok(match &self.remote_prefix {
            Some(prefix) => format!("{}/{}", prefix.trim_matches('/'), file_name),
            None => file_name.to_string(),
        })
    }
}

/// Percent-encode a remote path segment by segment, keeping `/` separators.
pub fn encode_remote_path(remote_path: &str) -> String {
    remote_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// HTTP client for a CDN-backed storage zone.
#[derive(Clone)]
pub struct EdgeStorageClient {
    http: Client,
    config: EdgeStorageConfig,
}

impl EdgeStorageClient {
    /// Create a new storage client from configuration.
    pub fn new(config: EdgeStorageConfig) -> StorageResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StorageError::config_error(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(EdgeStorageConfig::from_env()?)
    }

    pub fn config(&self) -> &EdgeStorageConfig {
        &self.config
    }

    /// Storage API URL an encoded remote path is PUT to.
    pub fn upload_url(&self, encoded_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.storage_endpoint.trim_end_matches('/'),
            self.config.zone_name,
            encoded_path
        )
    }

    /// Public URL an encoded remote path is served from.
    pub fn public_url(&self, encoded_path: &str) -> String {
        format!(
            "{}/{}",
            self.config.cdn_endpoint.trim_end_matches('/'),
            encoded_path
        )
    }

    /// Upload a local file and return its public URL.
    ///
    /// Only `201 Created` counts as success.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> StorageResult<String> {
        let path = path.as_ref();
        let remote_path = self.config.remote_path_for(path)?;
        let encoded = encode_remote_path(&remote_path);
        let url = self.upload_url(&encoded);

        let body = tokio::fs::read(path).await?;
        debug!("Uploading {} ({} bytes) to {}", path.display(), body.len(), url);

        let response = self
            .http
            .put(&url)
            .header("AccessKey", &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let message = response.text().await.unwrap_or_default();
            warn!(
                photo = %path.display(),
                status = status.as_u16(),
                "Storage rejected upload"
            );
            return Err(StorageError::upload_failed(status.as_u16(), message));
        }

        let public_url = self.public_url(&encoded);
        info!("Uploaded {} to {}", path.display(), public_url);
        Ok(public_url)
    }
}
