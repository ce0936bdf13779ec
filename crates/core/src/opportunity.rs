//! Opportunity workflow, field rules, and derived values.
//!
//! The opportunity lifecycle is a three-state machine:
//!
//! ```text
//!            convert                 lost
//! converted <-------- draft --------> lost
//!           --------->      <--------
//!             reset           reset
//! ```
//!
//! Only `draft` records can be converted or lost. Both terminal states can
//! be reset back to `draft`. While a record is not in `draft`, the identity
//! fields (description, start date, party, address, comment) are read-only.

use std::collections::HashSet;

use chrono::{Days, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Date, DbId};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of an opportunity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityState {
    #[default]
    Draft,
    Converted,
    Lost,
}

/// All valid state strings, in display order.
pub const VALID_STATES: &[&str] = &["draft", "converted", "lost"];

impl OpportunityState {
    /// Parse a state string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "converted" => Ok(Self::Converted),
            "lost" => Ok(Self::Lost),
            _ => Err(CoreError::Validation(format!(
                "Invalid opportunity state '{s}'. Must be one of: {VALID_STATES:?}"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }

    /// Converted and lost are the outcomes counted by the monthly view.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Converted | Self::Lost)
    }
}

impl std::fmt::Display for OpportunityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Every legal `(from, to)` edge of the opportunity workflow.
pub const TRANSITIONS: &[(OpportunityState, OpportunityState)] = &[
    (OpportunityState::Draft, OpportunityState::Converted),
    (OpportunityState::Draft, OpportunityState::Lost),
    (OpportunityState::Converted, OpportunityState::Draft),
    (OpportunityState::Lost, OpportunityState::Draft),
];

/// Returns the states reachable from `from` in one step.
pub fn valid_transitions(from: OpportunityState) -> Vec<OpportunityState> {
    TRANSITIONS
        .iter()
        .filter(|(f, _)| *f == from)
        .map(|(_, to)| *to)
        .collect()
}

/// Validate that moving from `current` to `next` is an edge of the table.
pub fn validate_transition(
    current: OpportunityState,
    next: OpportunityState,
) -> Result<(), CoreError> {
    if TRANSITIONS.contains(&(current, next)) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition(format!(
            "Cannot move opportunity from '{current}' to '{next}'. Allowed: {:?}",
            valid_transitions(current)
        )))
    }
}

// ---------------------------------------------------------------------------
// Transition operations
// ---------------------------------------------------------------------------

/// A workflow operation requested on a batch of opportunities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to `converted`. Without an explicit end date, today is used.
    Convert { end_date: Option<Date> },
    /// Move to `lost`, clearing the end date.
    Lost,
    /// Return a converted or lost record to `draft`.
    Reset,
}

/// What a transition does to `end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDateEffect {
    Keep,
    Set(Date),
    Clear,
}

impl EndDateEffect {
    /// The end date a record holds after the effect is applied.
    pub fn apply(self, current: Option<Date>) -> Option<Date> {
        match self {
            Self::Keep => current,
            Self::Set(date) => Some(date),
            Self::Clear => None,
        }
    }
}

impl Transition {
    /// Operation name as exposed by the API and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Convert { .. } => "convert",
            Self::Lost => "lost",
            Self::Reset => "reset",
        }
    }

    /// State every record in the batch ends up in.
    pub fn target(&self) -> OpportunityState {
        match self {
            Self::Convert { .. } => OpportunityState::Converted,
            Self::Lost => OpportunityState::Lost,
            Self::Reset => OpportunityState::Draft,
        }
    }

    /// Field side effect of the transition, resolved against `today`.
    pub fn end_date_effect(&self, today: Date) -> EndDateEffect {
        match self {
            Self::Convert { end_date } => EndDateEffect::Set(end_date.unwrap_or(today)),
            Self::Lost => EndDateEffect::Clear,
            Self::Reset => EndDateEffect::Keep,
        }
    }
}

/// The minimal view of a stored opportunity needed to check a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchMember {
    pub id: DbId,
    pub state: OpportunityState,
    pub start_date: Date,
    pub end_date: Option<Date>,
}

/// A batch transition that has passed every check and may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub target: OpportunityState,
    pub end_date: EndDateEffect,
}

/// Check a whole batch before anything is written.
///
/// Every member must be in a source state of the transition, and the
/// resulting dates must stay ordered. A single failing member rejects the
/// batch; nothing is partially applied.
pub fn plan_batch_transition(
    members: &[BatchMember],
    transition: Transition,
    today: Date,
) -> Result<TransitionPlan, CoreError> {
    if members.is_empty() {
        return Err(CoreError::Validation(format!(
            "No opportunities given for '{}'",
            transition.name()
        )));
    }

    let plan = TransitionPlan {
        target: transition.target(),
        end_date: transition.end_date_effect(today),
    };

    for member in members {
        validate_transition(member.state, plan.target).map_err(|_| {
            CoreError::InvalidTransition(format!(
                "Opportunity {} is '{}' and cannot be moved to '{}' by '{}'",
                member.id,
                member.state,
                plan.target,
                transition.name()
            ))
        })?;

        let end_date = plan.end_date.apply(member.end_date);
        validate_date_order(Some(member.start_date), end_date).map_err(|e| match e {
            CoreError::Validation(msg) => {
                CoreError::Validation(format!("Opportunity {}: {msg}", member.id))
            }
            other => other,
        })?;
    }

    Ok(plan)
}

/// Deduplicate a batch of ids while keeping the caller's order.
pub fn normalize_batch_ids(ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    if ids.is_empty() {
        return Err(CoreError::Validation(
            "At least one opportunity id is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    Ok(ids.iter().copied().filter(|id| seen.insert(*id)).collect())
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

/// Fields of an opportunity that callers may edit directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityField {
    Description,
    StartDate,
    EndDate,
    Party,
    Address,
    Comment,
}

impl OpportunityField {
    pub const ALL: [OpportunityField; 6] = [
        Self::Description,
        Self::StartDate,
        Self::EndDate,
        Self::Party,
        Self::Address,
        Self::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::Party => "party",
            Self::Address => "address",
            Self::Comment => "comment",
        }
    }

    /// Read-only once the record leaves `draft`.
    pub fn is_guarded(self) -> bool {
        !matches!(self, Self::EndDate)
    }
}

/// Access flags of one field for a record in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldState {
    pub field: OpportunityField,
    pub readonly: bool,
    pub required: bool,
}

/// Compute the read-only and required flags of every editable field.
pub fn field_state(state: OpportunityState, field: OpportunityField) -> FieldState {
    let readonly = field.is_guarded() && state != OpportunityState::Draft;
    let required = match field {
        OpportunityField::Description
        | OpportunityField::StartDate
        | OpportunityField::Party => true,
        OpportunityField::EndDate => state == OpportunityState::Converted,
        OpportunityField::Address | OpportunityField::Comment => false,
    };
    FieldState {
        field,
        readonly,
        required,
    }
}

pub fn field_states(state: OpportunityState) -> Vec<FieldState> {
    OpportunityField::ALL
        .iter()
        .map(|f| field_state(state, *f))
        .collect()
}

/// Reject edits that touch fields locked by the record's current state.
pub fn validate_edit(
    state: OpportunityState,
    changed: &[OpportunityField],
) -> Result<(), CoreError> {
    let locked: Vec<&str> = changed
        .iter()
        .filter(|f| field_state(state, **f).readonly)
        .map(|f| f.as_str())
        .collect();
    if locked.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Fields {locked:?} are read-only while the opportunity is '{state}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Record validation
// ---------------------------------------------------------------------------

/// Full set of user-facing values of an opportunity, as about to be written.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpportunityValues {
    pub description: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub party_id: Option<DbId>,
    pub address_id: Option<DbId>,
    pub comment: Option<String>,
    pub state: OpportunityState,
}

/// `start_date <= end_date` whenever both are present.
pub fn validate_date_order(start: Option<Date>, end: Option<Date>) -> Result<(), CoreError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(CoreError::Validation(format!(
            "Start date {start} must not be after end date {end}"
        ))),
        _ => Ok(()),
    }
}

/// Check required fields and date ordering of a record about to be written.
pub fn validate_record(values: &OpportunityValues) -> Result<(), CoreError> {
    let mut missing: Vec<&str> = Vec::new();
    if values
        .description
        .as_deref()
        .map_or(true, |d| d.trim().is_empty())
    {
        missing.push("description");
    }
    if values.start_date.is_none() {
        missing.push("start_date");
    }
    if values.party_id.is_none() {
        missing.push("party");
    }
    if values.state == OpportunityState::Converted && values.end_date.is_none() {
        missing.push("end_date");
    }
    if !missing.is_empty() {
        return Err(CoreError::Validation(format!(
            "Missing required fields: {missing:?}"
        )));
    }

    validate_date_order(values.start_date, values.end_date)
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

/// Days added to the start date when suggesting an end date.
pub const END_DATE_SUGGESTION_DAYS: u64 = 3;

/// `end - start` when both dates are set.
pub fn duration(start: Option<Date>, end: Option<Date>) -> Option<TimeDelta> {
    match (start, end) {
        (Some(start), Some(end)) => Some(end - start),
        _ => None,
    }
}

/// [`duration`] in whole days.
pub fn duration_days(start: Option<Date>, end: Option<Date>) -> Option<i64> {
    duration(start, end).map(|d| d.num_days())
}

/// End date offered to the user after the start date changes.
pub fn suggest_end_date(start: Option<Date>) -> Option<Date> {
    start.and_then(|s| s.checked_add_days(Days::new(END_DATE_SUGGESTION_DAYS)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    fn member(id: DbId, state: OpportunityState, end: Option<Date>) -> BatchMember {
        BatchMember {
            id,
            state,
            start_date: d(2024, 1, 1),
            end_date: end,
        }
    }

    fn draft_values() -> OpportunityValues {
        OpportunityValues {
            description: Some("Training course".to_string()),
            start_date: Some(d(2024, 1, 1)),
            party_id: Some(1),
            ..Default::default()
        }
    }

    // -- State --

    #[test]
    fn state_round_trips_through_db_strings() {
        for s in VALID_STATES {
            assert_eq!(OpportunityState::from_str_db(s).unwrap().as_str(), *s);
        }
        assert!(OpportunityState::from_str_db("won").is_err());
    }

    #[test]
    fn default_state_is_draft() {
        assert_eq!(OpportunityState::default(), OpportunityState::Draft);
        assert_eq!(OpportunityValues::default().state, OpportunityState::Draft);
    }

    // -- Transition table --

    #[test]
    fn draft_can_be_converted_or_lost() {
        assert!(validate_transition(OpportunityState::Draft, OpportunityState::Converted).is_ok());
        assert!(validate_transition(OpportunityState::Draft, OpportunityState::Lost).is_ok());
    }

    #[test]
    fn terminal_states_only_reset_to_draft() {
        for s in [OpportunityState::Converted, OpportunityState::Lost] {
            assert_eq!(valid_transitions(s), vec![OpportunityState::Draft]);
        }
        assert_matches!(
            validate_transition(OpportunityState::Lost, OpportunityState::Converted),
            Err(CoreError::InvalidTransition(_))
        );
        assert_matches!(
            validate_transition(OpportunityState::Converted, OpportunityState::Lost),
            Err(CoreError::InvalidTransition(_))
        );
    }

    #[test]
    fn draft_cannot_be_reset() {
        assert_matches!(
            validate_transition(OpportunityState::Draft, OpportunityState::Draft),
            Err(CoreError::InvalidTransition(_))
        );
    }

    // -- Batch planning --

    #[test]
    fn convert_without_date_uses_today() {
        let today = d(2024, 1, 10);
        let plan = plan_batch_transition(
            &[member(1, OpportunityState::Draft, None)],
            Transition::Convert { end_date: None },
            today,
        )
        .unwrap();
        assert_eq!(plan.target, OpportunityState::Converted);
        assert_eq!(plan.end_date.apply(None), Some(today));
    }

    #[test]
    fn convert_with_explicit_date_keeps_it() {
        let plan = plan_batch_transition(
            &[member(1, OpportunityState::Draft, None)],
            Transition::Convert {
                end_date: Some(d(2024, 2, 1)),
            },
            d(2024, 1, 10),
        )
        .unwrap();
        assert_eq!(plan.end_date, EndDateEffect::Set(d(2024, 2, 1)));
    }

    #[test]
    fn convert_before_start_date_is_rejected() {
        let result = plan_batch_transition(
            &[member(7, OpportunityState::Draft, None)],
            Transition::Convert {
                end_date: Some(d(2023, 12, 31)),
            },
            d(2024, 1, 10),
        );
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.contains("Opportunity 7"));
    }

    #[test]
    fn lost_clears_end_date() {
        let plan = plan_batch_transition(
            &[member(1, OpportunityState::Draft, Some(d(2024, 1, 4)))],
            Transition::Lost,
            d(2024, 1, 10),
        )
        .unwrap();
        assert_eq!(plan.target, OpportunityState::Lost);
        assert_eq!(plan.end_date.apply(Some(d(2024, 1, 4))), None);
    }

    #[test]
    fn reset_keeps_end_date() {
        let plan = plan_batch_transition(
            &[
                member(1, OpportunityState::Converted, Some(d(2024, 1, 4))),
                member(2, OpportunityState::Lost, None),
            ],
            Transition::Reset,
            d(2024, 1, 10),
        )
        .unwrap();
        assert_eq!(plan.target, OpportunityState::Draft);
        assert_eq!(plan.end_date.apply(Some(d(2024, 1, 4))), Some(d(2024, 1, 4)));
    }

    #[test]
    fn mixed_batch_is_rejected_whole() {
        let result = plan_batch_transition(
            &[
                member(1, OpportunityState::Draft, None),
                member(2, OpportunityState::Converted, Some(d(2024, 1, 2))),
            ],
            Transition::Lost,
            d(2024, 1, 10),
        );
        assert_matches!(result, Err(CoreError::InvalidTransition(msg)) if msg.contains("Opportunity 2"));
    }

    #[test]
    fn converting_twice_is_an_invalid_transition() {
        let result = plan_batch_transition(
            &[member(1, OpportunityState::Converted, Some(d(2024, 1, 2)))],
            Transition::Convert { end_date: None },
            d(2024, 1, 10),
        );
        assert_matches!(result, Err(CoreError::InvalidTransition(_)));
    }

    #[test]
    fn empty_batch_is_a_validation_error() {
        assert_matches!(
            plan_batch_transition(&[], Transition::Reset, d(2024, 1, 10)),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn normalize_batch_ids_dedups_in_order() {
        assert_eq!(normalize_batch_ids(&[3, 1, 3, 2, 1]).unwrap(), vec![3, 1, 2]);
        assert!(normalize_batch_ids(&[]).is_err());
    }

    // -- Field access --

    #[test]
    fn draft_fields_are_all_writable() {
        assert!(field_states(OpportunityState::Draft)
            .iter()
            .all(|fs| !fs.readonly));
    }

    #[test]
    fn guarded_fields_lock_outside_draft() {
        for state in [OpportunityState::Converted, OpportunityState::Lost] {
            for fs in field_states(state) {
                assert_eq!(fs.readonly, fs.field != OpportunityField::EndDate, "{fs:?}");
            }
        }
    }

    #[test]
    fn end_date_required_only_when_converted() {
        let required = |s| field_state(s, OpportunityField::EndDate).required;
        assert!(!required(OpportunityState::Draft));
        assert!(required(OpportunityState::Converted));
        assert!(!required(OpportunityState::Lost));
    }

    #[test]
    fn edit_of_locked_field_is_rejected() {
        assert!(validate_edit(OpportunityState::Lost, &[OpportunityField::EndDate]).is_ok());
        let err = validate_edit(
            OpportunityState::Converted,
            &[OpportunityField::EndDate, OpportunityField::Party],
        )
        .unwrap_err();
        assert!(err.to_string().contains("party"));
    }

    // -- Record validation --

    #[test]
    fn valid_draft_passes() {
        assert!(validate_record(&draft_values()).is_ok());
    }

    #[test]
    fn missing_required_fields_are_listed() {
        let values = OpportunityValues {
            description: Some("   ".to_string()),
            ..Default::default()
        };
        let msg = validate_record(&values).unwrap_err().to_string();
        assert!(msg.contains("description"));
        assert!(msg.contains("start_date"));
        assert!(msg.contains("party"));
    }

    #[test]
    fn converted_requires_end_date() {
        let values = OpportunityValues {
            state: OpportunityState::Converted,
            ..draft_values()
        };
        assert!(validate_record(&values).is_err());
        let values = OpportunityValues {
            end_date: Some(d(2024, 1, 5)),
            ..values
        };
        assert!(validate_record(&values).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected_in_any_state() {
        for state in [
            OpportunityState::Draft,
            OpportunityState::Converted,
            OpportunityState::Lost,
        ] {
            let values = OpportunityValues {
                end_date: Some(d(2023, 12, 1)),
                state,
                ..draft_values()
            };
            assert_matches!(validate_record(&values), Err(CoreError::Validation(_)));
        }
    }

    #[test]
    fn same_day_start_and_end_is_allowed() {
        assert!(validate_date_order(Some(d(2024, 1, 1)), Some(d(2024, 1, 1))).is_ok());
    }

    // -- Derived values --

    #[test]
    fn duration_counts_days_between_dates() {
        assert_eq!(duration_days(Some(d(2024, 1, 1)), Some(d(2024, 1, 4))), Some(3));
        assert_eq!(
            duration(Some(d(2024, 1, 1)), Some(d(2024, 1, 4))),
            Some(TimeDelta::days(3))
        );
    }

    #[test]
    fn duration_absent_without_end_date() {
        assert_eq!(duration_days(Some(d(2024, 1, 1)), None), None);
        assert_eq!(duration_days(None, Some(d(2024, 1, 1))), None);
    }

    #[test]
    fn end_date_suggestion_is_three_days_out() {
        assert_eq!(suggest_end_date(Some(d(2024, 2, 27))), Some(d(2024, 3, 1)));
        assert_eq!(suggest_end_date(None), None);
    }
}
