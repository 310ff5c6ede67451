//! Video provider seam, generation request types, and provider errors.

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::operation::VideoOperation;

/// Prompt used when the caller leaves it blank.
pub const DEFAULT_PROMPT: &str = "A cinematic, magical video transformation of this image.";

/// MIME type assumed when the caller does not send one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from a video provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The server-held provider credential is not configured.
    #[error("Server configuration error: Missing API Key")]
    MissingCredential,

    /// The generation request was rejected before reaching the provider.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Provider API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider's error message, or the raw body.
        message: String,
    },

    /// The provider answered 2xx with a body we could not interpret.
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Human-readable reason, preferring the provider's own message.
    pub fn reason(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Output framing. Only landscape and portrait are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    /// Parse `"16:9"` or `"9:16"`.
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value {
            "16:9" => Ok(Self::Landscape),
            "9:16" => Ok(Self::Portrait),
            other => Err(ProviderError::InvalidRequest(format!(
                "Unsupported aspect ratio '{other}'. Must be one of: 16:9, 9:16"
            ))),
        }
    }
}

/// Body of `POST /veo/start` as sent by browsers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartVideoRequest {
    /// Base64-encoded source image (no data-URL prefix).
    #[serde(default)]
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// A validated generation job with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    pub image_base64: String,
    pub mime_type: String,
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
}

impl StartVideoRequest {
    /// Validate the request and fill in defaults.
    ///
    /// The image must be non-empty standard base64. A leading data-URL
    /// prefix (`data:image/png;base64,`) is stripped, and its MIME type is
    /// used when none was sent explicitly.
    pub fn into_job(self) -> Result<VideoJob, ProviderError> {
        let (prefix_mime, payload) = split_data_url(self.image.trim());
        if payload.is_empty() {
            return Err(ProviderError::InvalidRequest("image is required".into()));
        }
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ProviderError::InvalidRequest(format!("image is not valid base64: {e}")))?;

        let aspect_ratio = match self.aspect_ratio.as_deref() {
            None | Some("") => AspectRatio::default(),
            Some(value) => AspectRatio::parse(value)?,
        };

        let mime_type = self
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .or(prefix_mime)
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        let prompt = self
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        Ok(VideoJob {
            image_base64: payload.to_string(),
            mime_type,
            prompt,
            aspect_ratio,
        })
    }
}

impl From<&VideoJob> for StartVideoRequest {
    fn from(job: &VideoJob) -> Self {
        Self {
            image: job.image_base64.clone(),
            mime_type: Some(job.mime_type.clone()),
            prompt: Some(job.prompt.clone()),
            aspect_ratio: Some(job.aspect_ratio.as_str().to_string()),
        }
    }
}

/// Split `data:<mime>;base64,<payload>` into its MIME type and payload.
fn split_data_url(image: &str) -> (Option<String>, &str) {
    let Some(rest) = image.strip_prefix("data:") else {
        return (None, image);
    };
    match rest.split_once(',') {
        Some((header, payload)) => {
            let mime = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .map(str::to_string);
            (mime, payload)
        }
        None => (None, image),
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A backend that can start a generation job and report on its progress.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Submit a generation job. Returns the provider's operation handle.
    async fn start(&self, job: &VideoJob) -> Result<VideoOperation, ProviderError>;

    /// Fetch the latest state of a previously started operation.
    async fn status(&self, operation: &VideoOperation) -> Result<VideoOperation, ProviderError>;
}
