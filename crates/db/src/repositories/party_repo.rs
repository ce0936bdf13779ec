//! Repository for the `parties` table.

use salesdesk_core::types::DbId;
use sqlx::PgPool;

use crate::models::party::{CreateParty, Party};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, phone, email, created_at, updated_at";

/// Provides CRUD operations for parties.
pub struct PartyRepo;

impl PartyRepo {
    /// Insert a new party, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateParty) -> Result<Party, sqlx::Error> {
        let query = format!(
            "INSERT INTO parties (name, phone, email)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Party>(&query)
            .bind(&input.name)
            .bind(&input.phone)
            .bind(&input.email)
            .fetch_one(pool)
            .await
    }

    /// Find a party by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Party>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parties WHERE id = $1");
        sqlx::query_as::<_, Party>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List parties alphabetically.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Party>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM parties ORDER BY name, id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, Party>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
