//! Generation service HTTP client.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use reel_models::{GenerationStatus, JobId};

use crate::error::{GenError, GenResult};
use crate::types::{CreateGenerationRequest, Generation};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.lumalabs.ai/dream-machine/v1";

/// Configuration for the generation client.
#[derive(Clone)]
pub struct GenerationClientConfig {
    /// Base URL of the generation API
    pub base_url: String,
    /// Bearer token
    pub auth_token: String,
    /// Optional aspect ratio sent with every generation (e.g. "16:9")
    pub aspect_ratio: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for submissions
    pub max_retries: u32,
}

impl std::fmt::Debug for GenerationClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClientConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .field("aspect_ratio", &self.aspect_ratio)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GenerationClientConfig {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: auth_token.into(),
            aspect_ratio: None,
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> GenResult<Self> {
        let auth_token = std::env::var("LUMA_API_KEY")
            .map_err(|_| GenError::Config("LUMA_API_KEY not set".to_string()))?;

        Ok(Self {
            base_url: std::env::var("LUMA_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            auth_token,
            aspect_ratio: std::env::var("LUMA_ASPECT_RATIO")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            timeout: Duration::from_secs(
                std::env::var("GENERATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("GENERATION_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
        })
    }
}

/// Client for the generation API.
#[derive(Clone)]
pub struct GenerationClient {
    http: Client,
    config: GenerationClientConfig,
}

impl GenerationClient {
    /// Create a new generation client.
    pub fn new(config: GenerationClientConfig) -> GenResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GenError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GenResult<Self> {
        Self::new(GenerationClientConfig::from_env()?)
    }

    pub fn config(&self) -> &GenerationClientConfig {
        &self.config
    }

    fn generations_url(&self) -> String {
        format!("{}/generations", self.config.base_url.trim_end_matches('/'))
    }

    /// Submit a transition from `frame_a_url` to `frame_b_url`.
    pub async fn submit(
        &self,
        prompt: &str,
        frame_a_url: &str,
        frame_b_url: &str,
    ) -> GenResult<JobId> {
        let mut request = CreateGenerationRequest::transition(prompt, frame_a_url, frame_b_url);
        request.aspect_ratio = self.config.aspect_ratio.clone();
        let url = self.generations_url();

        debug!("Creating generation at {}", url);

        let generation: Generation = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .bearer_auth(&self.config.auth_token)
                    .json(&request)
                    .send()
                    .await?;
                Self::parse(response).await
            })
            .await
            .map_err(GenError::into_submission)?;

        if generation.id.trim().is_empty() {
            return Err(GenError::Submission(
                "service returned an empty generation id".to_string(),
            ));
        }

        info!(job_id = %generation.id, "Generation submitted");
        Ok(JobId::from(generation.id))
    }

    /// Fetch the raw generation resource.
    pub async fn get(&self, job_id: &JobId) -> GenResult<Generation> {
        let url = format!(
            "{}/{}",
            self.generations_url(),
            urlencoding::encode(job_id.as_str())
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.auth_token)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Poll a generation once. Read-only; safe to repeat.
    pub async fn poll(&self, job_id: &JobId) -> GenResult<GenerationStatus> {
        let generation = self.get(job_id).await.map_err(GenError::into_poll)?;
        Ok(generation.status())
    }

    async fn parse(response: Response) -> GenResult<Generation> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenError::from_http_status(status.as_u16(), body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GenError::InvalidResponse(e.to_string()))
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> GenResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GenResult<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Generation request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
