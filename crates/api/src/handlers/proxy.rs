//! Same-origin relay for generated videos.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use wishwall_veo::proxy::ProxyError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub uri: Option<String>,
}

/// GET /api/proxy-video?uri=<encoded provider location>
///
/// Streams the upstream bytes back with the upstream content type. The
/// provider credential is appended server-side; nothing is cached.
pub async fn proxy_video(
    State(state): State<AppState>,
    Query(params): Query<ProxyQuery>,
) -> AppResult<Response> {
    let uri = params
        .uri
        .filter(|u| !u.trim().is_empty())
        .ok_or(ProxyError::MissingUri)?;
    let video = state.video()?;

    let media = video.proxy.fetch_and_relay(&uri).await?;

    let mut response = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = &media.content_type {
        response = response.header(CONTENT_TYPE, content_type);
    }
    if let Some(length) = media.content_length {
        response = response.header(CONTENT_LENGTH, length);
    }

    response
        .body(Body::from_stream(media.body))
        .map_err(|e| AppError::InternalError(format!("Failed to build proxy response: {e}")))
}
