//! PostgreSQL implementation of the persistence gateway.
//!
//! Reads rebuild each petition's signature list with one extra query per
//! petition row (N+1) instead of a join. That is fine for a fan site's
//! volume and keeps the row models flat.

use async_trait::async_trait;
use wishwall_core::gateway::{GatewayError, PetitionGateway};
use wishwall_core::petition::{Petition, Signature};

use crate::repositories::{PetitionRepo, SignatureRepo};
use crate::DbPool;

/// PostgreSQL error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL error code for `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Gateway backed by the `petitions` and `signatures` tables.
#[derive(Debug, Clone)]
pub struct PgPetitionGateway {
    pool: DbPool,
}

impl PgPetitionGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl PetitionGateway for PgPetitionGateway {
    async fn list_petitions(&self) -> Result<Vec<Petition>, GatewayError> {
        let rows = PetitionRepo::list_all(&self.pool)
            .await
            .map_err(classify_read_error)?;

        let mut petitions = Vec::with_capacity(rows.len());
        for row in rows {
            let signatures = SignatureRepo::list_for_petition(&self.pool, &row.id)
                .await
                .map_err(classify_read_error)?
                .into_iter()
                .map(Signature::from)
                .collect();
            petitions.push(row.into_petition(signatures));
        }

        tracing::debug!(count = petitions.len(), "Listed petitions");
        Ok(petitions)
    }

    async fn create_petition(&self, petition: &Petition) -> Result<(), GatewayError> {
        PetitionRepo::create(&self.pool, petition)
            .await
            .map_err(|e| match constraint_code(&e) {
                Some(UNIQUE_VIOLATION) => GatewayError::DuplicateId(petition.id.clone()),
                _ => classify_write_error(e),
            })?;

        tracing::info!(petition_id = %petition.id, "Petition stored");
        Ok(())
    }

    async fn add_signature(
        &self,
        petition_id: &str,
        signature: &Signature,
    ) -> Result<(), GatewayError> {
        SignatureRepo::create(&self.pool, petition_id, signature)
            .await
            .map_err(|e| match constraint_code(&e) {
                Some(FOREIGN_KEY_VIOLATION) => {
                    GatewayError::UnknownPetition(petition_id.to_string())
                }
                _ => classify_write_error(e),
            })?;

        tracing::info!(petition_id, signature_id = %signature.id, "Signature stored");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), GatewayError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| GatewayError::StoreUnavailable(e.to_string()))
    }
}

/// The PostgreSQL SQLSTATE for a constraint violation, if `err` is one.
fn constraint_code(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) => Some(UNIQUE_VIOLATION),
        Some(FOREIGN_KEY_VIOLATION) => Some(FOREIGN_KEY_VIOLATION),
        _ => None,
    }
}

/// Whether the error means the store could not be reached at all.
fn is_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_)
    )
}

/// Map a read failure to `StoreUnavailable` or `QueryError`.
pub fn classify_read_error(err: sqlx::Error) -> GatewayError {
    tracing::error!(error = %err, "Petition read failed");
    if is_unavailable(&err) {
        GatewayError::StoreUnavailable(err.to_string())
    } else {
        GatewayError::QueryError(err.to_string())
    }
}

/// Map a write failure that is not a known constraint violation.
pub fn classify_write_error(err: sqlx::Error) -> GatewayError {
    tracing::error!(error = %err, "Petition write failed");
    GatewayError::WriteError(err.to_string())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        assert_matches!(
            classify_read_error(sqlx::Error::PoolTimedOut),
            GatewayError::StoreUnavailable(_)
        );
    }

    #[test]
    fn decode_failure_is_query_error() {
        let err = sqlx::Error::ColumnNotFound("created_at".into());
        assert_matches!(classify_read_error(err), GatewayError::QueryError(_));
    }

    #[test]
    fn non_constraint_errors_have_no_code() {
        assert_eq!(constraint_code(&sqlx::Error::RowNotFound), None);
    }

    #[test]
    fn other_write_failures_are_write_errors() {
        assert_matches!(
            classify_write_error(sqlx::Error::PoolClosed),
            GatewayError::WriteError(_)
        );
    }
}
