//! Same-origin byte relay for generated media.
//!
//! Provider download locations need the server credential appended as a
//! `key` query parameter, and some client networks cannot reach the
//! provider host at all. [`MediaProxy`] fetches the bytes server-side and
//! hands back the upstream content type plus a byte stream. Nothing is
//! cached.

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};

use crate::config::VeoConfig;

/// Query parameter carrying the provider credential.
const KEY_PARAM: &str = "key";

/// Errors from the media relay.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Missing URI")]
    MissingUri,

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// The location is not on an allowlisted provider host.
    #[error("Host not allowed: {0}")]
    HostNotAllowed(String),

    /// Network failure or non-2xx upstream status.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

/// Upstream media ready to be streamed to the caller.
pub struct RelayedMedia {
    /// Upstream `Content-Type`, forwarded verbatim when present.
    pub content_type: Option<String>,
    /// Upstream `Content-Length`, when known.
    pub content_length: Option<u64>,
    /// Raw body bytes.
    pub body: BoxStream<'static, Result<Bytes, std::io::Error>>,
}

/// Relays provider media using the server-held credential.
#[derive(Clone)]
pub struct MediaProxy {
    client: reqwest::Client,
    api_key: String,
    allowed_hosts: Vec<String>,
}

impl MediaProxy {
    pub fn new(config: &VeoConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: &VeoConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            allowed_hosts: config.proxy_allowed_hosts.clone(),
        }
    }

    /// Fetch `remote_uri` with the credential appended and relay its bytes.
    pub async fn fetch_and_relay(&self, remote_uri: &str) -> Result<RelayedMedia, ProxyError> {
        let url = self.authorized_url(remote_uri)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!(uri = %remote_uri, error = %e.without_url(), "Media fetch failed");
            ProxyError::UpstreamUnavailable("Error fetching video".into())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(uri = %remote_uri, status = status.as_u16(), "Upstream rejected media fetch");
            return Err(ProxyError::UpstreamUnavailable(format!(
                "Failed to fetch video: {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        tracing::info!(uri = %remote_uri, content_type = ?content_type, "Relaying media");

        let body = response
            .bytes_stream()
            .map_err(|e| std::io::Error::other(e.without_url()))
            .boxed();

        Ok(RelayedMedia {
            content_type,
            content_length,
            body,
        })
    }

    /// Validate the location and append the credential.
    fn authorized_url(&self, remote_uri: &str) -> Result<reqwest::Url, ProxyError> {
        let remote_uri = remote_uri.trim();
        if remote_uri.is_empty() {
            return Err(ProxyError::MissingUri);
        }

        let mut url = reqwest::Url::parse(remote_uri)
            .map_err(|e| ProxyError::InvalidUri(format!("{remote_uri}: {e}")))?;

        if !matches!(url.scheme(), "https" | "http") {
            return Err(ProxyError::InvalidUri(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !self.allowed_hosts.iter().any(|allowed| *allowed == host) {
            return Err(ProxyError::HostNotAllowed(host));
        }

        url.query_pairs_mut().append_pair(KEY_PARAM, &self.api_key);
        Ok(url)
    }
}
