//! Handlers for the video generation endpoints.
//!
//! Both endpoints are thin relays: the browser drives the poll loop and
//! the server only adds the provider credential. Without a configured
//! credential they answer 500 `CONFIGURATION_ERROR`.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use wishwall_veo::operation::VideoOperation;
use wishwall_veo::provider::StartVideoRequest;

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;

/// Body of `POST /api/veo/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub operation: OperationRef,
}

/// The operation to check: either the object returned by a previous call
/// or just its resource name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OperationRef {
    Name(String),
    Operation(VideoOperation),
}

impl OperationRef {
    fn into_operation(self) -> VideoOperation {
        match self {
            Self::Name(name) => VideoOperation {
                name,
                ..Default::default()
            },
            Self::Operation(operation) => operation,
        }
    }
}

/// POST /api/veo/start
///
/// Submit an image-to-video job and return the provider's operation.
pub async fn start_generation(
    State(state): State<AppState>,
    AppJson(input): AppJson<StartVideoRequest>,
) -> AppResult<Json<VideoOperation>> {
    let video = state.video()?;
    let job = input.into_job()?;

    let operation = video.provider.start(&job).await?;
    tracing::info!(operation = %operation.name, "Video generation submitted");

    Ok(Json(operation))
}

/// POST /api/veo/status
///
/// Fetch the latest state of a running operation.
pub async fn generation_status(
    State(state): State<AppState>,
    AppJson(input): AppJson<StatusRequest>,
) -> AppResult<Json<VideoOperation>> {
    let video = state.video()?;
    let operation = input.operation.into_operation();
    if operation.name.trim().is_empty() {
        return Err(AppError::BadRequest("operation name is required".into()));
    }

    let latest = video.provider.status(&operation).await?;
    Ok(Json(latest))
}
