//! Time helpers - business timezone conversion
//!
//! Closures and reports work in venue-local calendar days, not UTC. All
//! date-to-timestamp conversion happens here; everything else passes `i64`
//! Unix millis around.

use chrono::NaiveDate;
use chrono_tz::Tz;
use shared::{CoreError, CoreResult};

/// Parse a date string (YYYY-MM-DD)
pub fn parse_date(date: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| CoreError::validation(format!("Invalid date format: {}", date)))
}

/// Validate a date is not in the future (business timezone)
pub fn validate_not_future(date: NaiveDate, tz: Tz) -> CoreResult<()> {
    let today = chrono::Utc::now().with_timezone(&tz).date_naive();
    if date > today {
        return Err(CoreError::validation(format!(
            "Date {} is in the future (today is {})",
            date, today
        )));
    }
    Ok(())
}

/// Date + time-of-day to Unix millis in the business timezone.
///
/// DST gap fallback: if the local time does not exist, fall back to UTC.
fn date_hms_to_millis(date: NaiveDate, hour: u32, min: u32, sec: u32, tz: Tz) -> i64 {
    let naive = date.and_hms_opt(hour, min, sec).unwrap();
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Start of day (00:00:00) in the business timezone
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    date_hms_to_millis(date, 0, 0, 0, tz)
}

/// End of day as next-day 00:00:00; callers use `< end` semantics
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    date_hms_to_millis(next_day, 0, 0, 0, tz)
}

/// Whether a timestamp falls on the given business-timezone calendar day
pub fn millis_on_date(millis: i64, date: NaiveDate, tz: Tz) -> bool {
    millis >= day_start_millis(date, tz) && millis < day_end_millis(date, tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TZ: Tz = chrono_tz::America::El_Salvador;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-06-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
        );
        assert!(parse_date("01/06/2024").is_err());
    }

    #[test]
    fn test_day_bounds_cover_exactly_one_day() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let start = day_start_millis(date, TZ);
        let end = day_end_millis(date, TZ);
        assert_eq!(end - start, 24 * 3600 * 1000);

        assert!(millis_on_date(start, date, TZ));
        assert!(millis_on_date(end - 1, date, TZ));
        assert!(!millis_on_date(end, date, TZ));
        assert!(!millis_on_date(start - 1, date, TZ));
    }

    #[test]
    fn test_local_day_differs_from_utc_day() {
        // 2024-06-02 03:00 UTC is still 2024-06-01 in El Salvador (UTC-6)
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let utc_next_day = chrono::NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert!(millis_on_date(utc_next_day, date, TZ));
    }
}
