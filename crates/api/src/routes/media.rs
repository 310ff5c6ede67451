use axum::routing::get;
use axum::Router;

use crate::handlers::{self, proxy};
use crate::state::AppState;

/// Media relay, mounted at `/api`.
///
/// ```text
/// GET    /proxy-video?uri=...   -> proxy_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/proxy-video",
        get(proxy::proxy_video).fallback(handlers::method_not_allowed),
    )
}
