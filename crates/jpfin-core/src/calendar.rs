//! Tokyo calendar dates
//!
//! Fiscal periods, filing dates and trading days are all Tokyo dates,
//! whatever the host time zone.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Japan Standard Time, UTC+9 without daylight saving
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

/// Tokyo calendar date of an instant
pub fn jst_date(at: DateTime<Utc>) -> NaiveDate {
    FixedOffset::east_opt(JST_OFFSET_SECS)
        .map_or_else(|| at.date_naive(), |jst| at.with_timezone(&jst).date_naive())
}

/// Today's date in Tokyo
pub fn today_jst() -> NaiveDate {
    jst_date(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jst_date_crosses_midnight_before_utc() {
        let at = DateTime::parse_from_rfc3339("2026-06-30T15:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(jst_date(at), NaiveDate::from_ymd_opt(2026, 7, 1).unwrap());

        let at = DateTime::parse_from_rfc3339("2026-06-30T14:59:59Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(jst_date(at), NaiveDate::from_ymd_opt(2026, 6, 30).unwrap());
    }
}
