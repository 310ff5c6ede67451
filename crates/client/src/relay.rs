//! [`VideoProvider`] that goes through the wish wall server instead of
//! calling the generation API directly, so the credential stays on the
//! server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wishwall_veo::operation::VideoOperation;
use wishwall_veo::provider::{ProviderError, StartVideoRequest, VideoJob, VideoProvider};

/// Error code the server uses when no provider credential is configured.
const MISSING_CREDENTIAL_CODE: &str = "CONFIGURATION_ERROR";

/// Calls `POST /api/veo/start` and `POST /api/veo/status`.
#[derive(Debug, Clone)]
pub struct RelayVideoProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    operation: &'a VideoOperation,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: Option<String>,
}

impl RelayVideoProvider {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<VideoOperation, ProviderError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) if body.code.as_deref() == Some(MISSING_CREDENTIAL_CODE) => {
                    ProviderError::MissingCredential
                }
                Ok(body) if !body.error.is_empty() => ProviderError::Api {
                    status: status.as_u16(),
                    message: body.error,
                },
                _ => ProviderError::Api {
                    status: status.as_u16(),
                    message: text,
                },
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl VideoProvider for RelayVideoProvider {
    async fn start(&self, job: &VideoJob) -> Result<VideoOperation, ProviderError> {
        self.post("/api/veo/start", &StartVideoRequest::from(job)).await
    }

    async fn status(&self, operation: &VideoOperation) -> Result<VideoOperation, ProviderError> {
        self.post("/api/veo/status", &StatusBody { operation }).await
    }
}
