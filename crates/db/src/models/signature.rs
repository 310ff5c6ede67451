//! Row model for the `signatures` table.

use sqlx::FromRow;
use wishwall_core::petition::Signature;
use wishwall_core::types::{EntityId, EpochMillis};

/// A row from the `signatures` table.
#[derive(Debug, Clone, FromRow)]
pub struct SignatureRow {
    pub id: EntityId,
    pub petition_id: EntityId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub timestamp: EpochMillis,
}

impl From<SignatureRow> for Signature {
    fn from(row: SignatureRow) -> Self {
        Signature {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            timestamp: row.timestamp,
        }
    }
}
