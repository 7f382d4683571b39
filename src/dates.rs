//! Calendar ranges used by the report commands.
//!
//! All ranges are in local time and inclusive on both ends: a day runs from
//! 00:00:00.000 to 23:59:59.999.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::error::ConfigError;
use crate::vcs::DateRange;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// The calendar day containing `now`.
pub fn today_range(now: DateTime<Local>) -> DateRange {
    day_span(now.date_naive(), now.date_naive())
}

/// Monday through Sunday of the week containing `now`.
pub fn this_week_range(now: DateTime<Local>) -> DateRange {
    let monday = week_start(now.date_naive());
    day_span(monday, monday + Duration::days(6))
}

/// Monday through Sunday of the week before the one containing `now`.
pub fn last_week_range(now: DateTime<Local>) -> DateRange {
    let monday = week_start(now.date_naive()) - Duration::days(7);
    day_span(monday, monday + Duration::days(6))
}

/// Range from two `YYYY-MM-DD` strings, start of `start` to end of `end`.
///
/// The bounds are not reordered; an inverted range selects nothing.
pub fn custom_range(start: &str, end: &str) -> Result<DateRange, ConfigError> {
    Ok(day_span(parse_day(start)?, parse_day(end)?))
}

/// `YYYY-MM-DD` when the range covers one day, else `YYYY-MM-DD_YYYY-MM-DD`.
pub fn filename_date_part(range: &DateRange) -> String {
    let (start, end) = day_labels(range);
    if start == end {
        start
    } else {
        format!("{}_{}", start, end)
    }
}

/// `YYYY-MM-DD` when the range covers one day, else `start ~ end`.
pub fn display_range(range: &DateRange) -> String {
    let (start, end) = day_labels(range);
    if start == end {
        start
    } else {
        format!("{} ~ {}", start, end)
    }
}

pub fn parse_day(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT)
        .map_err(|_| ConfigError::InvalidDate(value.to_string()))
}

fn day_labels(range: &DateRange) -> (String, String) {
    (
        range.start.format(DAY_FORMAT).to_string(),
        range.end.format(DAY_FORMAT).to_string(),
    )
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

fn day_span(first: NaiveDate, last: NaiveDate) -> DateRange {
    let start = first.and_time(NaiveTime::MIN);
    let end = last.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1);
    DateRange::new(local(start), local(end))
}

/// Resolve a wall-clock time, taking the earlier instant across DST overlaps.
fn local(naive: NaiveDateTime) -> DateTime<Local> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}
