//! Business-day calendar (Monday–Friday, no holidays).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Every weekday in `[start, end]`, in order. Empty when `start > end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

/// The day before `date`, saturating at the minimum date.
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

pub fn days_before(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn business_days_skip_weekend() {
        // 2025-06-13 is a Friday
        let days = business_days(d(2025, 6, 13), d(2025, 6, 17));
        assert_eq!(days, vec![d(2025, 6, 13), d(2025, 6, 16), d(2025, 6, 17)]);
    }

    #[test]
    fn business_days_inclusive_week() {
        let days = business_days(d(2025, 6, 16), d(2025, 6, 20));
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&d(2025, 6, 16)));
        assert_eq!(days.last(), Some(&d(2025, 6, 20)));
    }

    #[test]
    fn weekend_only_range_is_empty() {
        assert!(business_days(d(2025, 6, 14), d(2025, 6, 15)).is_empty());
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(business_days(d(2025, 6, 20), d(2025, 6, 16)).is_empty());
    }

    #[test]
    fn lookback_arithmetic() {
        assert_eq!(days_before(d(2025, 6, 16), 90), d(2025, 3, 18));
        assert_eq!(previous_day(d(2025, 6, 16)), d(2025, 6, 15));
    }
}
