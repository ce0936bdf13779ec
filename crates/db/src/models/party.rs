//! Party entity model and DTOs.

use salesdesk_core::party::PartyContact;
use salesdesk_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A row from the `parties` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Party {
    pub id: DbId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Party {
    /// Contact details used to prefill opportunity fields.
    pub fn contact(&self) -> PartyContact<'_> {
        PartyContact {
            name: &self.name,
            phone: self.phone.as_deref(),
            email: self.email.as_deref(),
        }
    }
}

/// DTO for creating a new party.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateParty {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
}
