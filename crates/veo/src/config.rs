//! Provider configuration, resolved once at startup.

use std::fmt;

/// Default REST endpoint for the Gemini API.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default video model.
pub const DEFAULT_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Output resolution requested for every job.
pub const DEFAULT_RESOLUTION: &str = "720p";

/// Settings for the Veo client and the media proxy.
///
/// `Debug` redacts the API key.
#[derive(Clone)]
pub struct VeoConfig {
    /// Server-held credential for the provider.
    pub api_key: String,
    /// Base URL without trailing slash (default: [`DEFAULT_API_BASE_URL`]).
    pub api_base_url: String,
    /// Model id (default: [`DEFAULT_MODEL`]).
    pub model: String,
    /// Hosts the media proxy may relay from. The credential is only ever
    /// appended to URLs on these hosts.
    pub proxy_allowed_hosts: Vec<String>,
}

impl VeoConfig {
    /// Build a config with default endpoint, model, and proxy allowlist.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            proxy_allowed_hosts: vec![host_of(DEFAULT_API_BASE_URL)],
        }
    }

    /// Point the client at a different base URL and allow proxying from it.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base_url = base_url.into().trim_end_matches('/').to_string();
        self.proxy_allowed_hosts = vec![host_of(&self.api_base_url)];
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `GOOGLE_API_KEY` is unset or blank; video
    /// features are then unavailable.
    ///
    /// | Env Var                   | Default                                   |
    /// |---------------------------|-------------------------------------------|
    /// | `GOOGLE_API_KEY`          | (required)                                |
    /// | `VEO_API_BASE_URL`        | `https://generativelanguage.googleapis.com` |
    /// | `VEO_MODEL`               | `veo-3.1-fast-generate-preview`           |
    /// | `VEO_PROXY_ALLOWED_HOSTS` | host of `VEO_API_BASE_URL`                |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;

        let mut config = Self::new(api_key);

        if let Ok(base_url) = std::env::var("VEO_API_BASE_URL") {
            config = config.with_base_url(base_url);
        }

        if let Ok(model) = std::env::var("VEO_MODEL") {
            config.model = model;
        }

        if let Ok(hosts) = std::env::var("VEO_PROXY_ALLOWED_HOSTS") {
            config.proxy_allowed_hosts = parse_host_list(&hosts);
        }

        Some(config)
    }
}

impl fmt::Debug for VeoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeoConfig")
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("model", &self.model)
            .field("proxy_allowed_hosts", &self.proxy_allowed_hosts)
            .finish()
    }
}

/// Parse a comma-separated host list, dropping blanks.
pub fn parse_host_list(hosts: &str) -> Vec<String> {
    hosts
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Host portion of a base URL (`https://host:port/path` -> `host`).
fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}
