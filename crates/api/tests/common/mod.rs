#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use wishwall_api::config::ServerConfig;
use wishwall_api::router::build_app_router;
use wishwall_api::state::{AppState, VideoServices};
use wishwall_core::gateway::{MemoryPetitionGateway, PetitionGateway};

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        proxy_timeout_secs: 30,
    }
}

/// Build the full application router over an empty in-memory store and
/// with video generation disabled.
pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(MemoryPetitionGateway::new()), None)
}

/// Build the full application router with the given store and video
/// services, using the same middleware stack as production.
pub fn build_test_app_with(
    gateway: Arc<dyn PetitionGateway>,
    video: Option<VideoServices>,
) -> Router {
    let config = test_config();
    let state = AppState {
        gateway,
        config: Arc::new(config.clone()),
        video,
    };
    build_app_router(state, &config)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
