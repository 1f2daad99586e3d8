//! Spreadsheet serial dates
//!
//! Excel stores dates as the number of days since 1899-12-30 with the time of
//! day as the fractional part. Serials before 1900-03-01 are one lower because
//! Excel keeps the Lotus 1-2-3 leap day 1900-02-29.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{ExportError, Result};

/// `num_days_from_ce` of 1899-12-30
const EPOCH_DAYS_FROM_CE: i32 = 693_594;
/// Serial of 1900-03-01, the first day after the phantom leap day
const LEAP_BUG_SERIAL: i32 = 61;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Serial day number of a calendar date
pub fn date_serial(date: NaiveDate) -> f64 {
    let mut days = date.num_days_from_ce() - EPOCH_DAYS_FROM_CE;
    if days < LEAP_BUG_SERIAL {
        days -= 1;
    }
    days as f64
}

/// Serial number of a date and time of day
pub fn excel_serial(datetime: NaiveDateTime) -> f64 {
    let time = datetime.time();
    let seconds = time.num_seconds_from_midnight() as f64
        + time.nanosecond() as f64 / 1_000_000_000.0;
    date_serial(datetime.date()) + seconds / SECONDS_PER_DAY
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a stored date or datetime string.
///
/// Accepts `YYYY-MM-DD` (midnight) and `YYYY-MM-DD HH:MM[:SS[.fff]]`, with
/// either a space or `T` separator.
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| ExportError::InvalidValue(format!("'{}' is not a date", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_serial() {
        assert_eq!(date_serial(date(1900, 1, 1)), 1.0);
        assert_eq!(date_serial(date(1900, 2, 28)), 59.0);
        assert_eq!(date_serial(date(1900, 3, 1)), 61.0);
        assert_eq!(date_serial(date(2017, 12, 5)), 43074.0);
    }

    #[test]
    fn test_excel_serial_time_fraction() {
        let dt = date(2017, 12, 5).and_hms_opt(18, 0, 0).unwrap();
        assert!((excel_serial(dt) - 43074.75).abs() < 1e-9);
    }

    #[test]
    fn test_parse_datetime() {
        let expected = date(2017, 12, 5).and_hms_opt(10, 30, 15).unwrap();
        assert_eq!(parse_datetime("2017-12-05 10:30:15").unwrap(), expected);
        assert_eq!(parse_datetime("2017-12-05T10:30:15").unwrap(), expected);
        assert_eq!(
            parse_datetime("2017-12-05").unwrap(),
            date(2017, 12, 5).and_hms_opt(0, 0, 0).unwrap()
        );
        assert!(matches!(
            parse_datetime("05/12/2017"),
            Err(ExportError::InvalidValue(_))
        ));
    }
}
