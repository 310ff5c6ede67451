use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the petition store is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub store_healthy: bool,
    /// False when no provider credential was configured at startup.
    pub video_enabled: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_healthy = match state.gateway.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Petition store health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: if store_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_healthy,
        video_enabled: state.video.is_some(),
    })
}

/// Mounted at the root, outside `/api`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
