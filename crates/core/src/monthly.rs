//! Monthly outcome view: converted and lost opportunities per month.
//!
//! The view is never stored. It is rebuilt from the current opportunity
//! rows on every read, so it always reflects the live data.

use std::collections::BTreeMap;

use chrono::{Datelike, Days};
use serde::Serialize;

use crate::opportunity::OpportunityState;
use crate::types::Date;

/// One row of the monthly view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// First day of the month.
    pub month: Date,
    pub converted: i64,
    pub lost: i64,
}

/// Truncate a date to the first day of its month.
pub fn truncate_to_month(date: Date) -> Date {
    date - Days::new(u64::from(date.day0()))
}

/// Group terminal opportunities by the month of their end date.
///
/// Draft records and records without an end date are skipped. Months with
/// no converted or lost opportunity produce no row. Rows are ordered by
/// month ascending.
pub fn aggregate_monthly<I>(outcomes: I) -> Vec<MonthlyCount>
where
    I: IntoIterator<Item = (OpportunityState, Option<Date>)>,
{
    let mut months: BTreeMap<Date, MonthlyCount> = BTreeMap::new();

    for (state, end_date) in outcomes {
        let Some(end_date) = end_date.filter(|_| state.is_terminal()) else {
            continue;
        };
        let month = truncate_to_month(end_date);
        let row = months.entry(month).or_insert(MonthlyCount {
            month,
            converted: 0,
            lost: 0,
        });
        match state {
            OpportunityState::Converted => row.converted += 1,
            OpportunityState::Lost => row.lost += 1,
            OpportunityState::Draft => {}
        }
    }

    months.into_values().collect()
}
