//! Convert wizard steps and validation.
//!
//! The wizard asks for an end date and then converts the selected
//! opportunities with it:
//!
//! ```text
//! start --(convert)--> convert --> end
//!       \--(cancel)-------------> end
//! ```
//!
//! It is stateless on the server; the client carries the ids and the
//! collected end date from one step to the next.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::opportunity::{normalize_batch_ids, Transition};
use crate::types::{Date, DbId};

/// Wizard states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Form asking for the end date.
    Start,
    /// Conversion is being applied.
    Convert,
    /// Finished, with or without effect.
    End,
}

/// Buttons offered on the start form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardButton {
    Cancel,
    Convert,
}

impl WizardButton {
    /// The step reached by pressing this button on the start form.
    pub fn next_step(self) -> WizardStep {
        match self {
            Self::Cancel => WizardStep::End,
            Self::Convert => WizardStep::Convert,
        }
    }
}

/// The single form shown by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertForm {
    pub ids: Vec<DbId>,
    pub end_date: Option<Date>,
}

/// Build the start form, with the end date pre-filled to `today`.
pub fn start(ids: &[DbId], today: Date) -> Result<ConvertForm, CoreError> {
    Ok(ConvertForm {
        ids: normalize_batch_ids(ids)?,
        end_date: Some(today),
    })
}

/// Turn a confirmed form into the conversion to run.
///
/// Unlike a direct `convert`, the wizard requires the end date.
pub fn confirm(form: &ConvertForm) -> Result<(Vec<DbId>, Transition), CoreError> {
    let ids = normalize_batch_ids(&form.ids)?;
    let end_date = form
        .end_date
        .ok_or_else(|| CoreError::Validation("End date is required to convert".to_string()))?;
    Ok((
        ids,
        Transition::Convert {
            end_date: Some(end_date),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn start_defaults_end_date_to_today() {
        let form = start(&[4, 2, 4], d(2024, 1, 10)).unwrap();
        assert_eq!(form.ids, vec![4, 2]);
        assert_eq!(form.end_date, Some(d(2024, 1, 10)));
    }

    #[test]
    fn start_requires_ids() {
        assert_matches!(start(&[], d(2024, 1, 10)), Err(CoreError::Validation(_)));
    }

    #[test]
    fn confirm_passes_end_date_to_convert() {
        let form = ConvertForm {
            ids: vec![1],
            end_date: Some(d(2024, 2, 1)),
        };
        let (ids, transition) = confirm(&form).unwrap();
        assert_eq!(ids, vec![1]);
        assert_eq!(
            transition,
            Transition::Convert {
                end_date: Some(d(2024, 2, 1))
            }
        );
    }

    #[test]
    fn confirm_without_end_date_is_rejected() {
        let form = ConvertForm {
            ids: vec![1],
            end_date: None,
        };
        assert_matches!(confirm(&form), Err(CoreError::Validation(_)));
    }

    #[test]
    fn buttons_lead_to_expected_steps() {
        assert_eq!(WizardButton::Cancel.next_step(), WizardStep::End);
        assert_eq!(WizardButton::Convert.next_step(), WizardStep::Convert);
    }
}
