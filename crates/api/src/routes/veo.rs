//! Route definitions for video generation.

use axum::routing::post;
use axum::Router;

use crate::handlers::{self, veo};
use crate::state::AppState;

/// Routes mounted at `/api/veo`.
///
/// ```text
/// POST   /veo/start     -> start_generation
/// POST   /veo/status    -> generation_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/veo/start",
            post(veo::start_generation).fallback(handlers::method_not_allowed),
        )
        .route(
            "/veo/status",
            post(veo::generation_status).fallback(handlers::method_not_allowed),
        )
}
