//! Date utilities

use chrono::{Local, NaiveDate};

/// Today's calendar date in the local time zone
///
/// Expiry dates are printed on packaging as local calendar dates, so
/// "today" is the local date rather than the UTC one.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
