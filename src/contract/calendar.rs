// src/contract/calendar.rs
//! Business-day counting for deriving time to expiry from a calendar date.
//!
//! ```text
//! T = (business_days_between(today, expiry) + 1) / 252
//! ```

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

use crate::error::{PricingError, PricingResult};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Source of trading days. Implementations decide what a holiday is.
pub trait TradingCalendar {
    /// Number of trading days in the half-open interval `[start, end)`.
    /// Negative (counting `[end, start)`) when `end < start`.
    fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64;

    fn trading_holidays(&self) -> &BTreeSet<NaiveDate>;
}

/// Monday to Friday, minus an explicit holiday set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        WeekdayCalendar {
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    fn count_forward(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        start
            .iter_days()
            .take_while(|d| *d < end)
            .filter(|d| self.is_business_day(*d))
            .count() as i64
    }
}

impl TradingCalendar for WeekdayCalendar {
    fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if end >= start {
            self.count_forward(start, end)
        } else {
            -self.count_forward(end, start)
        }
    }

    fn trading_holidays(&self) -> &BTreeSet<NaiveDate> {
        &self.holidays
    }
}

/// Year fraction from `today` to `expiry` in trading-day units.
///
/// The `+ 1` counts the expiry session itself, so an option expiring today
/// still carries one day of time value.
pub fn year_fraction_to_expiry(
    calendar: &dyn TradingCalendar,
    today: NaiveDate,
    expiry: NaiveDate,
) -> PricingResult<f64> {
    let days = calendar.business_days_between(today, expiry) + 1;
    if days <= 0 {
        return Err(PricingError::InvalidParameters {
            parameter: "expiry_date".to_string(),
            value: days as f64,
            constraint: format!("expiry {} is before the valuation date {}", expiry, today),
        });
    }
    Ok(days as f64 / TRADING_DAYS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_skipped() {
        let cal = WeekdayCalendar::new();
        // Mon 2020-09-14 .. Mon 2020-09-21 (exclusive) = 5 sessions
        assert_eq!(cal.business_days_between(date(2020, 9, 14), date(2020, 9, 21)), 5);
        // Sat -> Mon
        assert_eq!(cal.business_days_between(date(2020, 9, 19), date(2020, 9, 21)), 0);
    }

    #[test]
    fn test_reverse_interval_negative() {
        let cal = WeekdayCalendar::new();
        assert_eq!(cal.business_days_between(date(2020, 9, 21), date(2020, 9, 14)), -5);
    }

    #[test]
    fn test_holidays_removed() {
        let labor_day = date(2020, 9, 7);
        let cal = WeekdayCalendar::with_holidays([labor_day]);
        assert!(!cal.is_business_day(labor_day));
        assert_eq!(cal.business_days_between(date(2020, 9, 7), date(2020, 9, 14)), 4);
        assert!(cal.trading_holidays().contains(&labor_day));
    }

    #[test]
    fn test_year_fraction() {
        let cal = WeekdayCalendar::new();
        let t = year_fraction_to_expiry(&cal, date(2020, 9, 14), date(2020, 9, 18)).unwrap();
        assert_eq!(t, 5.0 / 252.0);
        let same_day = year_fraction_to_expiry(&cal, date(2020, 9, 18), date(2020, 9, 18)).unwrap();
        assert_eq!(same_day, 1.0 / 252.0);
        assert!(year_fraction_to_expiry(&cal, date(2020, 9, 18), date(2020, 9, 1)).is_err());
    }
}
