//! Route definitions for the petition store.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{self, petitions};
use crate::state::AppState;

/// Routes mounted at `/api`.
///
/// ```text
/// GET    /petitions    -> list_petitions
/// POST   /petitions    -> create_petition
/// POST   /sign         -> sign_petition
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/petitions",
            get(petitions::list_petitions)
                .post(petitions::create_petition)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/sign",
            post(petitions::sign_petition).fallback(handlers::method_not_allowed),
        )
}
