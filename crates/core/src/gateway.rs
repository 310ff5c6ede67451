//! Persistence gateway seam between the petition model and a remote store.
//!
//! [`PetitionGateway`] is implemented by the PostgreSQL store in
//! `wishwall-db`, by the HTTP client in `wishwall-client`, and by
//! [`MemoryPetitionGateway`] for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::petition::{Petition, Signature};
use crate::types::EntityId;

/// Failures reported by a persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored data could not be read back into the domain model.
    #[error("Query error: {0}")]
    QueryError(String),

    /// A petition with this id already exists.
    #[error("Petition id already exists: {0}")]
    DuplicateId(EntityId),

    /// A signature referenced a petition that does not exist.
    #[error("Unknown petition: {0}")]
    UnknownPetition(EntityId),

    /// Any other write failure.
    #[error("Write error: {0}")]
    WriteError(String),
}

impl GatewayError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::QueryError(_) => "QUERY_ERROR",
            Self::DuplicateId(_) => "DUPLICATE_ID",
            Self::UnknownPetition(_) => "UNKNOWN_PETITION",
            Self::WriteError(_) => "WRITE_ERROR",
        }
    }

    /// Rebuild an error from its wire code and message.
    ///
    /// Unrecognised codes fall back to [`GatewayError::WriteError`].
    pub fn from_code(code: &str, message: String) -> Self {
        match code {
            "STORE_UNAVAILABLE" => Self::StoreUnavailable(message),
            "QUERY_ERROR" => Self::QueryError(message),
            "DUPLICATE_ID" => Self::DuplicateId(message),
            "UNKNOWN_PETITION" => Self::UnknownPetition(message),
            _ => Self::WriteError(message),
        }
    }
}

/// Request/response mapping between the domain model and a remote store.
#[async_trait]
pub trait PetitionGateway: Send + Sync {
    /// All petitions with their signatures, newest (`createdAt`) first.
    async fn list_petitions(&self) -> Result<Vec<Petition>, GatewayError>;

    /// Insert a new petition keyed by its id. Signatures are not written.
    async fn create_petition(&self, petition: &Petition) -> Result<(), GatewayError>;

    /// Insert a signature for an existing petition.
    async fn add_signature(
        &self,
        petition_id: &str,
        signature: &Signature,
    ) -> Result<(), GatewayError>;

    /// Cheap reachability probe.
    async fn health_check(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// In-process gateway with the same constraint semantics as the SQL store:
/// primary-key uniqueness on petitions and signatures, and a foreign key
/// from signatures to petitions.
#[derive(Debug, Default)]
pub struct MemoryPetitionGateway {
    petitions: RwLock<HashMap<EntityId, Petition>>,
}

impl MemoryPetitionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored petitions.
    pub async fn len(&self) -> usize {
        self.petitions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PetitionGateway for MemoryPetitionGateway {
    async fn list_petitions(&self) -> Result<Vec<Petition>, GatewayError> {
        let mut all: Vec<Petition> = self.petitions.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn create_petition(&self, petition: &Petition) -> Result<(), GatewayError> {
        let mut petitions = self.petitions.write().await;
        if petitions.contains_key(&petition.id) {
            return Err(GatewayError::DuplicateId(petition.id.clone()));
        }
        let mut stored = petition.clone();
        stored.signatures.clear();
        petitions.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn add_signature(
        &self,
        petition_id: &str,
        signature: &Signature,
    ) -> Result<(), GatewayError> {
        let mut petitions = self.petitions.write().await;
        let duplicate = petitions
            .values()
            .flat_map(|p| p.signatures.iter())
            .any(|s| s.id == signature.id);
        if duplicate {
            return Err(GatewayError::WriteError(format!(
                "signature id already exists: {}",
                signature.id
            )));
        }
        let petition = petitions
            .get_mut(petition_id)
            .ok_or_else(|| GatewayError::UnknownPetition(petition_id.to_string()))?;
        petition.append_signature(signature.clone());
        Ok(())
    }
}
