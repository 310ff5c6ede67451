//! Handlers for the petition store endpoints.
//!
//! The browser owns id and timestamp generation; the server re-runs the
//! moderation and required-field checks before writing, then maps store
//! failures onto coded 500 responses.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use wishwall_core::petition::{
    check_timestamp, validate_signature, Petition, PetitionDraft, Signature,
};
use wishwall_core::types::{now_millis, EntityId, EpochMillis};

use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::state::AppState;

/// `{ "petitions": [...] }` listing envelope.
#[derive(Debug, Serialize)]
pub struct PetitionsResponse {
    pub petitions: Vec<Petition>,
}

/// `{ "success": true }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Body of `POST /api/petitions`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionRequest {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: String,
    pub created_at: EpochMillis,
}

/// Body of `POST /api/sign`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    pub petition_id: EntityId,
    pub signature: Signature,
}

/// GET /api/petitions
///
/// All petitions with their signatures, newest first.
pub async fn list_petitions(
    State(state): State<AppState>,
) -> AppResult<Json<PetitionsResponse>> {
    let petitions = state.gateway.list_petitions().await?;
    Ok(Json(PetitionsResponse { petitions }))
}

/// POST /api/petitions
///
/// Store a petition created by the browser. Blocked content and missing
/// fields are rejected with 400 before anything is written.
pub async fn create_petition(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreatePetitionRequest>,
) -> AppResult<Json<SuccessResponse>> {
    if input.id.trim().is_empty() {
        return Err(AppError::BadRequest("id is required".into()));
    }
    check_timestamp("createdAt", input.created_at, now_millis())?;

    let draft = PetitionDraft {
        title: input.title,
        description: input.description,
        image_url: input.image_url,
        author: input.author,
    };
    let petition = draft.into_petition(input.id, input.created_at)?;

    state.gateway.create_petition(&petition).await?;
    tracing::info!(petition_id = %petition.id, author = %petition.author, "Petition stored");

    Ok(SuccessResponse::ok())
}

/// POST /api/sign
///
/// Append a signature to an existing petition.
pub async fn sign_petition(
    State(state): State<AppState>,
    AppJson(input): AppJson<SignRequest>,
) -> AppResult<Json<SuccessResponse>> {
    if input.petition_id.trim().is_empty() {
        return Err(AppError::BadRequest("petitionId is required".into()));
    }
    validate_signature(&input.signature)?;
    check_timestamp("timestamp", input.signature.timestamp, now_millis())?;

    state
        .gateway
        .add_signature(&input.petition_id, &input.signature)
        .await?;
    tracing::info!(
        petition_id = %input.petition_id,
        signature_id = %input.signature.id,
        "Signature stored",
    );

    Ok(SuccessResponse::ok())
}
