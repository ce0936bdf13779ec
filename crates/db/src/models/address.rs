//! Party address model and DTOs.

use salesdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `party_addresses` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Address {
    pub id: DbId,
    pub party_id: DbId,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an address. The owning party comes from the route.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAddress {
    #[validate(length(max = 255))]
    pub street: Option<String>,
    #[validate(length(max = 255))]
    pub city: Option<String>,
    #[validate(length(max = 32))]
    pub zip: Option<String>,
    #[validate(length(max = 64))]
    pub country: Option<String>,
}
