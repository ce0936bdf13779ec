//! Source of "today" for date defaults.

use salesdesk_core::types::Date;

/// The current calendar date in UTC.
///
/// Used for the default start date of new opportunities, the default end
/// date of `convert`, and the convert wizard's pre-filled end date.
pub fn today() -> Date {
    chrono::Utc::now().date_naive()
}
