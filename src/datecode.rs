//! Date Codes - ISO week based `YYWW`

use chrono::{Datelike, Duration, Local, NaiveDate};

/// ISO-8601 week of `date` as `(iso_year, week)`.
///
/// The date is moved to the Thursday of its week (Monday=1 .. Sunday=7);
/// the week number counts 7-day periods from January 1st of that Thursday's
/// year, so the Thursday's year is the ISO year.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let weekday = i64::from(date.weekday().number_from_monday());
    let thursday = date
        .checked_add_signed(Duration::days(4 - weekday))
        .unwrap_or(date);
    let week = (thursday.ordinal0() + 1).div_ceil(7);
    (thursday.year(), week)
}

/// `YYWW` code for `date`: low two digits of the ISO year, zero-padded week.
pub fn date_code(date: NaiveDate) -> String {
    let (year, week) = iso_week(date);
    format!("{:02}{:02}", year.rem_euclid(100), week)
}

/// Date code for today's local calendar date.
pub fn current_date_code() -> String {
    date_code(Local::now().date_naive())
}
