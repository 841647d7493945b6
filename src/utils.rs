use crate::error::{FinanceError, Result};
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(days_in_month(date.year(), date.month()))
        .unwrap_or(date)
}

/// Shifts a date by whole calendar months, clamping to the last valid day
/// of the target month (Jan 31 + 1 month = Feb 28/29).
///
/// Dates that would leave chrono's representable range are returned unchanged.
pub fn shift_months(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// Sunday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    shift_days(date, -i64::from(date.weekday().num_days_from_sunday()))
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// 00:00:00.000 on the given calendar date.
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on the given calendar date.
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    day_start(date) + Duration::milliseconds(86_399_999)
}

pub fn month_label(month: u32) -> &'static str {
    MONTH_LABELS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

pub fn weekday_label(days_from_sunday: u32) -> &'static str {
    WEEKDAY_LABELS
        .get(days_from_sunday as usize)
        .copied()
        .unwrap_or("")
}

/// Replaces NaN and infinities with zero so they never reach callers.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    finite_or_zero(value).clamp(0.0, 100.0)
}

pub fn round_percent(value: f64) -> f64 {
    finite_or_zero(value).round()
}

/// Reads the calendar date a record was stored with.
///
/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp, or an
/// RFC 3339 timestamp. The date is taken from the stored components rather
/// than converted through UTC, so `2024-03-01T00:00:00Z` stays on March 1st
/// regardless of the host's offset.
pub fn normalize_calendar_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(timestamp.date());
        }
    }

    Err(FinanceError::DateError(format!(
        "Invalid calendar date: '{}'. Expected YYYY-MM-DD or an ISO 8601 timestamp",
        raw
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(1900, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(last_day_of_month(ymd(2024, 2, 10)), ymd(2024, 2, 29));
        assert_eq!(last_day_of_month(ymd(2023, 4, 1)), ymd(2023, 4, 30));
    }

    #[test]
    fn test_shift_months_clamps_to_month_end() {
        assert_eq!(shift_months(ymd(2024, 1, 31), 1), ymd(2024, 2, 29));
        assert_eq!(shift_months(ymd(2024, 3, 31), -1), ymd(2024, 2, 29));
        assert_eq!(shift_months(ymd(2024, 2, 29), 12), ymd(2025, 2, 28));
        assert_eq!(shift_months(ymd(2023, 12, 15), 1), ymd(2024, 1, 15));
    }

    #[test]
    fn test_start_of_week() {
        // 2024-03-15 is a Friday
        assert_eq!(start_of_week(ymd(2024, 3, 15)), ymd(2024, 3, 10));
        assert_eq!(start_of_week(ymd(2024, 3, 10)), ymd(2024, 3, 10));
        // Crosses a month boundary
        assert_eq!(start_of_week(ymd(2024, 3, 1)), ymd(2024, 2, 25));
    }

    #[test]
    fn test_day_bounds() {
        let date = ymd(2024, 3, 15);
        assert_eq!(day_start(date).to_string(), "2024-03-15 00:00:00");
        assert_eq!(day_end(date).to_string(), "2024-03-15 23:59:59.999");
    }

    #[test]
    fn test_normalize_calendar_date_formats() {
        let expected = ymd(2024, 3, 1);
        assert_eq!(normalize_calendar_date("2024-03-01").unwrap(), expected);
        assert_eq!(normalize_calendar_date(" 2024-03-01 ").unwrap(), expected);
        assert_eq!(
            normalize_calendar_date("2024-03-01T00:00:00.000Z").unwrap(),
            expected
        );
        assert_eq!(
            normalize_calendar_date("2024-03-01T23:30:00-08:00").unwrap(),
            expected
        );
        assert_eq!(
            normalize_calendar_date("2024-03-01T18:45:00").unwrap(),
            expected
        );
    }

    #[test]
    fn test_normalize_calendar_date_rejects_garbage() {
        assert!(normalize_calendar_date("").is_err());
        assert!(normalize_calendar_date("yesterday").is_err());
        assert!(normalize_calendar_date("2024-02-30").is_err());
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(-3.0), 0.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(round_percent(86.666), 87.0);
        assert_eq!(round_percent(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(month_label(1), "Jan");
        assert_eq!(month_label(12), "Dec");
        assert_eq!(month_label(13), "");
        assert_eq!(weekday_label(0), "Sun");
        assert_eq!(weekday_label(6), "Sat");
    }
}
