//! Repository for the `party_addresses` table.

use salesdesk_core::types::DbId;
use sqlx::postgres::PgExecutor;
use sqlx::PgPool;

use crate::models::address::{Address, CreateAddress};

const COLUMNS: &str = "id, party_id, street, city, zip, country, created_at, updated_at";

/// Provides CRUD operations for party addresses.
pub struct AddressRepo;

impl AddressRepo {
    /// Insert a new address owned by `party_id`.
    pub async fn create(
        pool: &PgPool,
        party_id: DbId,
        input: &CreateAddress,
    ) -> Result<Address, sqlx::Error> {
        let query = format!(
            "INSERT INTO party_addresses (party_id, street, city, zip, country)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Address>(&query)
            .bind(party_id)
            .bind(&input.street)
            .bind(&input.city)
            .bind(&input.zip)
            .bind(&input.country)
            .fetch_one(pool)
            .await
    }

    /// Find an address by ID.
    pub async fn find_by_id<'e, E>(executor: E, id: DbId) -> Result<Option<Address>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {COLUMNS} FROM party_addresses WHERE id = $1");
        sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// All addresses of a party, oldest first.
    pub async fn list_by_party(
        pool: &PgPool,
        party_id: DbId,
    ) -> Result<Vec<Address>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM party_addresses WHERE party_id = $1 ORDER BY id");
        sqlx::query_as::<_, Address>(&query)
            .bind(party_id)
            .fetch_all(pool)
            .await
    }
}
