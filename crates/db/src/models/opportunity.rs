//! Opportunity entity model and DTOs.

use salesdesk_core::error::CoreError;
use salesdesk_core::opportunity::{
    duration_days, BatchMember, OpportunityField, OpportunityState, OpportunityValues,
};
use salesdesk_core::types::{Date, DbId, Timestamp};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// A row from the `opportunities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Opportunity {
    pub id: DbId,
    pub description: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub party_id: DbId,
    pub address_id: Option<DbId>,
    pub comment: Option<String>,
    pub state: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Opportunity {
    /// Parse the stored state string.
    pub fn state(&self) -> Result<OpportunityState, CoreError> {
        OpportunityState::from_str_db(&self.state)
    }

    /// Whole days between start and end date, if the end date is set.
    pub fn duration_days(&self) -> Option<i64> {
        duration_days(Some(self.start_date), self.end_date)
    }

    pub fn batch_member(&self) -> Result<BatchMember, CoreError> {
        Ok(BatchMember {
            id: self.id,
            state: self.state()?,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }

    /// The row's editable values, as input to validation.
    pub fn values(&self) -> Result<OpportunityValues, CoreError> {
        Ok(OpportunityValues {
            description: Some(self.description.clone()),
            start_date: Some(self.start_date),
            end_date: self.end_date,
            party_id: Some(self.party_id),
            address_id: self.address_id,
            comment: self.comment.clone(),
            state: self.state()?,
        })
    }
}

/// An opportunity together with its derived duration.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityWithDuration {
    #[serde(flatten)]
    pub opportunity: Opportunity,
    pub duration_days: Option<i64>,
}

impl From<Opportunity> for OpportunityWithDuration {
    fn from(opportunity: Opportunity) -> Self {
        let duration_days = opportunity.duration_days();
        Self {
            opportunity,
            duration_days,
        }
    }
}

/// DTO for creating a new opportunity.
///
/// `description` and `comment` fall back to the party's name and contact
/// details; `start_date` falls back to today.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOpportunity {
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub party_id: DbId,
    pub address_id: Option<DbId>,
    pub comment: Option<String>,
}

/// DTO for editing an opportunity. Only fields present in the body are applied.
///
/// The optional columns distinguish an absent key (keep) from an explicit
/// `null` (clear).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOpportunity {
    pub description: Option<String>,
    pub start_date: Option<Date>,
    #[serde(default, deserialize_with = "nullable")]
    pub end_date: Option<Option<Date>>,
    pub party_id: Option<DbId>,
    #[serde(default, deserialize_with = "nullable")]
    pub address_id: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub comment: Option<Option<String>>,
}

/// Deserialize a present key into `Some`, keeping an explicit `null` as `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateOpportunity {
    /// Fields this update touches.
    pub fn changed_fields(&self) -> Vec<OpportunityField> {
        let mut fields = Vec::new();
        if self.description.is_some() {
            fields.push(OpportunityField::Description);
        }
        if self.start_date.is_some() {
            fields.push(OpportunityField::StartDate);
        }
        if self.end_date.is_some() {
            fields.push(OpportunityField::EndDate);
        }
        if self.party_id.is_some() {
            fields.push(OpportunityField::Party);
        }
        if self.address_id.is_some() {
            fields.push(OpportunityField::Address);
        }
        if self.comment.is_some() {
            fields.push(OpportunityField::Comment);
        }
        fields
    }

    /// Overlay this update onto the current values.
    ///
    /// Moving to another party without naming an address drops the old
    /// address, which belonged to the previous party.
    pub fn apply_to(&self, mut values: OpportunityValues) -> OpportunityValues {
        if let Some(description) = &self.description {
            values.description = Some(description.clone());
        }
        if let Some(start_date) = self.start_date {
            values.start_date = Some(start_date);
        }
        if let Some(end_date) = self.end_date {
            values.end_date = end_date;
        }
        if let Some(party_id) = self.party_id {
            if values.party_id != Some(party_id) && self.address_id.is_none() {
                values.address_id = None;
            }
            values.party_id = Some(party_id);
        }
        if let Some(address_id) = self.address_id {
            values.address_id = address_id;
        }
        if let Some(comment) = &self.comment {
            values.comment = comment.clone();
        }
        values
    }
}

/// Query parameters for listing opportunities.
#[derive(Debug, Deserialize)]
pub struct OpportunityListParams {
    pub state: Option<String>,
    pub party_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body of the `lost` and `reset` batch operations and of duration queries.
#[derive(Debug, Clone, Deserialize)]
pub struct OpportunityIds {
    pub ids: Vec<DbId>,
}

/// Body of the `convert` batch operation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertOpportunities {
    pub ids: Vec<DbId>,
    /// Defaults to today when omitted.
    pub end_date: Option<Date>,
}

/// Derived duration of one opportunity.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityDuration {
    pub id: DbId,
    pub duration_days: Option<i64>,
}

/// State and end date of a converted or lost opportunity.
#[derive(Debug, Clone, FromRow)]
pub struct TerminalOutcome {
    pub state: String,
    pub end_date: Option<Date>,
}
