//! Form suggestion hooks evaluated while a user edits an opportunity.
//!
//! These never persist anything. The client sends the current form values
//! and the field that just changed, and gets back the values with the
//! suggestions applied plus the recomputed duration.

use serde::{Deserialize, Serialize};

use crate::opportunity::{duration_days, suggest_end_date};
use crate::party::{apply_party_defaults, PartyContact};
use crate::types::Date;

/// Editable values of an opportunity form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityForm {
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub comment: Option<String>,
    /// Set once the user typed an end date; suggestions stop overwriting it.
    #[serde(default)]
    pub end_date_edited: bool,
}

/// The field whose change triggered the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedField {
    Party,
    StartDate,
    EndDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnChangeResult {
    pub form: OpportunityForm,
    pub duration_days: Option<i64>,
}

/// Apply the suggestion for `changed` to `form`.
///
/// `party` is the newly selected party when `changed` is [`ChangedField::Party`];
/// `None` means the party was cleared and nothing is filled in.
pub fn on_change(
    mut form: OpportunityForm,
    changed: ChangedField,
    party: Option<&PartyContact<'_>>,
) -> OnChangeResult {
    match changed {
        ChangedField::Party => {
            if let Some(contact) = party {
                apply_party_defaults(&mut form.description, &mut form.comment, contact);
            }
        }
        ChangedField::StartDate => {
            if !form.end_date_edited {
                form.end_date = suggest_end_date(form.start_date);
            }
        }
        ChangedField::EndDate => form.end_date_edited = true,
    }

    let duration_days = duration_days(form.start_date, form.end_date);
    OnChangeResult {
        form,
        duration_days,
    }
}
