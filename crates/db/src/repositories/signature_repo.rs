//! Repository for the `signatures` table.

use sqlx::PgPool;
use wishwall_core::petition::Signature;

use crate::models::signature::SignatureRow;

/// Column list for `signatures` queries.
const SIGNATURE_COLUMNS: &str = "id, petition_id, first_name, last_name, email, timestamp";

/// Provides insert and per-petition listing for signatures.
pub struct SignatureRepo;

impl SignatureRepo {
    /// Insert a signature row. Fails with a foreign-key violation when the
    /// petition does not exist.
    pub async fn create(
        pool: &PgPool,
        petition_id: &str,
        signature: &Signature,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO signatures (id, petition_id, first_name, last_name, email, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&signature.id)
        .bind(petition_id)
        .bind(&signature.first_name)
        .bind(&signature.last_name)
        .bind(&signature.email)
        .bind(signature.timestamp)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Signatures for one petition in the order the store accepted them.
    pub async fn list_for_petition(
        pool: &PgPool,
        petition_id: &str,
    ) -> Result<Vec<SignatureRow>, sqlx::Error> {
        let query = format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures \
             WHERE petition_id = $1 \
             ORDER BY seq ASC"
        );
        sqlx::query_as::<_, SignatureRow>(&query)
            .bind(petition_id)
            .fetch_all(pool)
            .await
    }
}
