pub mod health;
pub mod media;
pub mod petitions;
pub mod veo;

use axum::Router;

use crate::state::AppState;

/// Build the JSON `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /petitions                 list (GET), create (POST)
/// /sign                      add signature (POST)
///
/// /veo/start                 submit generation (POST)
/// /veo/status                poll generation (POST)
/// ```
///
/// The media relay (`/proxy-video`) is mounted separately by
/// [`media::router`] because it runs under a longer timeout.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(petitions::router())
        .merge(veo::router())
}
