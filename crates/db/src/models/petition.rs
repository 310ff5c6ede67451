//! Row model for the `petitions` table.

use sqlx::FromRow;
use wishwall_core::petition::{Petition, Signature};
use wishwall_core::types::{EntityId, EpochMillis};

/// A row from the `petitions` table (signatures live in their own table).
#[derive(Debug, Clone, FromRow)]
pub struct PetitionRow {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub author: String,
    pub created_at: EpochMillis,
}

impl PetitionRow {
    /// Attach the petition's signatures to produce the domain entity.
    pub fn into_petition(self, signatures: Vec<Signature>) -> Petition {
        Petition {
            id: self.id,
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            author: self.author,
            created_at: self.created_at,
            signatures,
        }
    }
}
