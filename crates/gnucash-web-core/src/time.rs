//! Date helpers for balances and GnuCash timestamps

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};

/// Today's date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month before the one containing `date`
pub fn previous_month_end(date: NaiveDate) -> Option<NaiveDate> {
    month_start(date).pred_opt()
}

/// Parse a transaction post date.
///
/// GnuCash 2.6 and later write `YYYY-MM-DD HH:MM:SS`, older books use
/// `YYYYMMDDHHMMSS`. Only the date part is kept.
pub fn parse_post_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%d%H%M%S"))
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_previous_month_end_mid_month() {
        assert_eq!(previous_month_end(date(2024, 5, 17)), Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_previous_month_end_on_first_day() {
        assert_eq!(previous_month_end(date(2024, 5, 1)), Some(date(2024, 4, 30)));
    }

    #[test]
    fn test_previous_month_end_leap_year_and_january() {
        assert_eq!(previous_month_end(date(2024, 3, 31)), Some(date(2024, 2, 29)));
        assert_eq!(previous_month_end(date(2023, 3, 2)), Some(date(2023, 2, 28)));
        assert_eq!(previous_month_end(date(2025, 1, 9)), Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_month_start() {
        assert_eq!(month_start(date(2024, 2, 29)), date(2024, 2, 1));
    }

    #[test]
    fn test_parse_post_date_formats() {
        assert_eq!(parse_post_date("2024-05-17 10:59:00"), Some(date(2024, 5, 17)));
        assert_eq!(parse_post_date("20240517105900"), Some(date(2024, 5, 17)));
        assert_eq!(parse_post_date("2024-05-17"), Some(date(2024, 5, 17)));
        assert_eq!(parse_post_date("yesterday"), None);
    }
}
