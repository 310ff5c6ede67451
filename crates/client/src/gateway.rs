//! [`PetitionGateway`] over the wish wall HTTP API.
//!
//! Talks to `GET/POST /api/petitions` and `POST /api/sign`. Error bodies
//! (`{ "error": ..., "code": ... }`) are mapped back onto [`GatewayError`]
//! by code; transport failures are reported as
//! [`GatewayError::StoreUnavailable`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use wishwall_core::gateway::{GatewayError, PetitionGateway};
use wishwall_core::petition::{Petition, Signature};
use wishwall_core::types::EpochMillis;

/// HTTP client for the petition endpoints.
#[derive(Debug, Clone)]
pub struct HttpPetitionGateway {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct PetitionList {
    petitions: Vec<Petition>,
}

/// Body of `POST /api/petitions`. Signatures are never sent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPetition<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    image_url: Option<&'a str>,
    author: &'a str,
    created_at: EpochMillis,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignBody<'a> {
    petition_id: &'a str,
    signature: &'a Signature,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    code: Option<String>,
}

impl HttpPetitionGateway {
    /// `base_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Petition API unreachable");
            GatewayError::StoreUnavailable(e.to_string())
        })?;
        Self::ensure_success(response).await
    }

    /// Map a non-2xx response onto the gateway error named by its code.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                error,
                code: Some(code),
            }) => GatewayError::from_code(&code, error),
            Ok(ErrorBody { error, code: None }) if !error.is_empty() => {
                GatewayError::WriteError(error)
            }
            _ => GatewayError::WriteError(format!("HTTP {status}: {body}")),
        };
        tracing::error!(status = status.as_u16(), code = err.code(), error = %err, "Petition API error");
        Err(err)
    }
}

#[async_trait]
impl PetitionGateway for HttpPetitionGateway {
    async fn list_petitions(&self) -> Result<Vec<Petition>, GatewayError> {
        let response = self.send(self.client.get(self.url("/api/petitions"))).await?;
        let list: PetitionList = response
            .json()
            .await
            .map_err(|e| GatewayError::QueryError(e.to_string()))?;
        Ok(list.petitions)
    }

    async fn create_petition(&self, petition: &Petition) -> Result<(), GatewayError> {
        let body = NewPetition {
            id: &petition.id,
            title: &petition.title,
            description: &petition.description,
            image_url: petition.image_url.as_deref(),
            author: &petition.author,
            created_at: petition.created_at,
        };
        self.send(self.client.post(self.url("/api/petitions")).json(&body))
            .await?;
        Ok(())
    }

    async fn add_signature(
        &self,
        petition_id: &str,
        signature: &Signature,
    ) -> Result<(), GatewayError> {
        let body = SignBody {
            petition_id,
            signature,
        };
        self.send(self.client.post(self.url("/api/sign")).json(&body))
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        self.send(self.client.get(self.url("/health"))).await?;
        Ok(())
    }
}
