use std::sync::Arc;

use wishwall_core::gateway::PetitionGateway;
use wishwall_veo::provider::{ProviderError, VideoProvider};
use wishwall_veo::proxy::MediaProxy;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Petition store (PostgreSQL in production, in-memory in tests).
    pub gateway: Arc<dyn PetitionGateway>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Video generation services. `None` when no provider credential was
    /// configured at startup.
    pub video: Option<VideoServices>,
}

/// Provider client and media relay, built once from the provider config.
#[derive(Clone)]
pub struct VideoServices {
    pub provider: Arc<dyn VideoProvider>,
    pub proxy: MediaProxy,
}

impl AppState {
    /// The video services, or the missing-credential error.
    pub fn video(&self) -> Result<&VideoServices, ProviderError> {
        self.video.as_ref().ok_or(ProviderError::MissingCredential)
    }
}
