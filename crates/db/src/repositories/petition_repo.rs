//! Repository for the `petitions` table.

use sqlx::PgPool;
use wishwall_core::petition::Petition;

use crate::models::petition::PetitionRow;

/// Column list for `petitions` queries.
const PETITION_COLUMNS: &str = "id, title, description, image_url, author, created_at";

/// Provides insert and listing operations for petitions.
pub struct PetitionRepo;

impl PetitionRepo {
    /// Insert a petition row. Fails on primary-key conflict.
    pub async fn create(pool: &PgPool, petition: &Petition) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO petitions (id, title, description, image_url, author, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&petition.id)
        .bind(&petition.title)
        .bind(&petition.description)
        .bind(petition.image_url.as_deref())
        .bind(&petition.author)
        .bind(petition.created_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// All petition rows, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<PetitionRow>, sqlx::Error> {
        let query = format!("SELECT {PETITION_COLUMNS} FROM petitions ORDER BY created_at DESC");
        sqlx::query_as::<_, PetitionRow>(&query).fetch_all(pool).await
    }
}
