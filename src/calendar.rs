//! Date arithmetic for the timeline.
//!
//! All task dates are `NaiveDate`s: a date-only value cannot drift across a
//! daylight-saving shift. Timestamps arriving from the outside are pinned to
//! midday before being reduced to a date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::error::ValidationError;

/// Reference time of day used when a date has to be expressed as a timestamp.
pub fn midday() -> NaiveTime {
    NaiveTime::MIN + Duration::hours(12)
}

/// Pin a timestamp to midday of the same calendar day.
pub fn normalize(datetime: NaiveDateTime) -> NaiveDateTime {
    datetime.date().and_time(midday())
}

pub fn at_midday(date: NaiveDate) -> NaiveDateTime {
    date.and_time(midday())
}

pub fn to_date(datetime: NaiveDateTime) -> NaiveDate {
    normalize(datetime).date()
}

/// Shift `date` by a signed number of days. Fails instead of leaving the
/// range chrono can represent.
pub fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, ValidationError> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or(ValidationError::DateOutOfRange { date, days })
}

/// Signed number of days in `a - b`.
pub fn diff_days(a: NaiveDate, b: NaiveDate) -> i64 {
    (a - b).num_days()
}

/// Saturday and Sunday are the only non-working days.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Advance `date` to the first working day on or after it.
pub fn snap_forward(date: NaiveDate) -> NaiveDate {
    let mut current = date;
    while is_weekend(current) {
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    current
}

/// Parse an external date: either `YYYY-MM-DD` or an RFC 3339 timestamp, in
/// which case the calendar day in the timestamp's own offset is used.
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|datetime| to_date(datetime.naive_local()))
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_the_calendar_day() {
        let late = NaiveDate::from_ymd_opt(2025, 3, 30)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let normalized = normalize(late);
        assert_eq!(normalized.date(), late.date());
        assert_eq!(normalized.time(), midday());
    }
}
