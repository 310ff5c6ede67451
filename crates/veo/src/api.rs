//! REST client for the hosted Veo video generation API.
//!
//! Wraps the two long-running-operation endpoints (start via
//! `models/{model}:predictLongRunning`, status via `GET {operation name}`)
//! using [`reqwest`], and converts the REST response shape into
//! [`VideoOperation`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::{VeoConfig, DEFAULT_RESOLUTION};
use crate::operation::{GenerateVideosResponse, GeneratedVideo, OperationError, VideoOperation};
use crate::provider::{ProviderError, VideoJob, VideoProvider};

/// Header carrying the API key, keeping it out of URLs and access logs.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// API version path segment.
const API_VERSION: &str = "v1beta";

/// HTTP client for the hosted generation API.
pub struct VeoApi {
    client: reqwest::Client,
    config: VeoConfig,
}

// ---------------------------------------------------------------------------
// Wire types (REST shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOperation {
    #[serde(default)]
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<RawResponse>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    #[serde(default)]
    generate_video_response: Option<RawVideoResponse>,
    /// Some API revisions already use the SDK field name.
    #[serde(default)]
    generated_videos: Option<Vec<GeneratedVideo>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
struct RawErrorEnvelope {
    error: RawErrorBody,
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    #[serde(default)]
    message: String,
}

impl From<RawOperation> for VideoOperation {
    fn from(raw: RawOperation) -> Self {
        let response = raw.response.map(|r| {
            let generated_videos = match (r.generated_videos, r.generate_video_response) {
                (Some(videos), _) => videos,
                (None, Some(inner)) => inner.generated_samples,
                (None, None) => Vec::new(),
            };
            GenerateVideosResponse { generated_videos }
        });
        VideoOperation {
            name: raw.name,
            done: raw.done,
            response,
            error: raw.error,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl VeoApi {
    pub fn new(config: VeoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: VeoConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &VeoConfig {
        &self.config
    }

    /// Submit an image-to-video job.
    ///
    /// Requests a single video at [`DEFAULT_RESOLUTION`]. Returns the
    /// provider's operation handle, normally with `done: false`.
    pub async fn generate_video(&self, job: &VideoJob) -> Result<VideoOperation, ProviderError> {
        let body = json!({
            "instances": [{
                "prompt": job.prompt,
                "image": {
                    "bytesBase64Encoded": job.image_base64,
                    "mimeType": job.mime_type,
                },
            }],
            "parameters": {
                "aspectRatio": job.aspect_ratio.as_str(),
                "resolution": DEFAULT_RESOLUTION,
                "sampleCount": 1,
            },
        });

        let url = format!(
            "{}/{API_VERSION}/models/{}:predictLongRunning",
            self.config.api_base_url, self.config.model
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let operation = Self::parse_operation(response).await?;
        tracing::info!(
            operation = %operation.name,
            model = %self.config.model,
            aspect_ratio = job.aspect_ratio.as_str(),
            "Video generation started",
        );
        Ok(operation)
    }

    /// Fetch the current state of an operation by resource name.
    pub async fn get_operation(&self, name: &str) -> Result<VideoOperation, ProviderError> {
        let name = name.trim_start_matches('/');
        if name.is_empty() {
            return Err(ProviderError::InvalidRequest(
                "operation name is required".into(),
            ));
        }

        let response = self
            .client
            .get(format!("{}/{API_VERSION}/{name}", self.config.api_base_url))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let operation = Self::parse_operation(response).await?;
        tracing::debug!(operation = %operation.name, done = operation.done, "Polled video operation");
        Ok(operation)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, surfacing the
    /// provider's error message otherwise.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message = serde_json::from_str::<RawErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn parse_operation(response: reqwest::Response) -> Result<VideoOperation, ProviderError> {
        let response = Self::ensure_success(response).await?;
        let raw: RawOperation = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if raw.name.is_empty() {
            return Err(ProviderError::Malformed("operation has no name".into()));
        }
        Ok(raw.into())
    }
}

#[async_trait]
impl VideoProvider for VeoApi {
    async fn start(&self, job: &VideoJob) -> Result<VideoOperation, ProviderError> {
        self.generate_video(job).await
    }

    async fn status(&self, operation: &VideoOperation) -> Result<VideoOperation, ProviderError> {
        self.get_operation(&operation.name).await
    }
}
