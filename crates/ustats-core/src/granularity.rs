//! Calendar periods that bucket files are cut along.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Size of the calendar period covered by one bucket file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    /// ISO weeks, Monday to Sunday.
    Week,
    #[default]
    Month,
    Year,
}

impl Granularity {
    /// String representation for configuration files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// First day of the period containing `date`.
    #[must_use]
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date - Duration::days(i64::from(date.day0())),
            Self::Year => date - Duration::days(i64::from(date.ordinal0())),
        }
    }

    /// First day of the period following the one containing `date`.
    ///
    /// Returns `None` at the end of the representable calendar.
    #[must_use]
    pub fn next_period_start(self, date: NaiveDate) -> Option<NaiveDate> {
        let start = self.period_start(date);
        match self {
            Self::Day => start.succ_opt(),
            Self::Week => start.checked_add_signed(Duration::days(7)),
            Self::Month => start.checked_add_months(Months::new(1)),
            Self::Year => start.checked_add_months(Months::new(12)),
        }
    }

    /// Inclusive `(first, last)` days of the period containing `date`.
    #[must_use]
    pub fn period(self, date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let last = self
            .next_period_start(date)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        (self.period_start(date), last)
    }

    /// Label of the period containing `date`, used in bucket file names.
    #[must_use]
    pub fn label(self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Self::Month => date.format("%Y-%m").to_string(),
            Self::Year => date.format("%Y").to_string(),
        }
    }

    /// Start days of every period intersecting `[start, end]`, chronologically.
    ///
    /// Empty when `start > end`.
    pub fn periods(self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let first = (start <= end).then(|| self.period_start(start));
        std::iter::successors(first, move |current| self.next_period_start(*current))
            .take_while(move |period| *period <= end)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "year" | "yearly" => Ok(Self::Year),
            _ => Err(ValidationError::UnknownGranularity {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_period_covers_whole_month() {
        assert_eq!(
            Granularity::Month.period(day(2024, 2, 17)),
            (day(2024, 2, 1), day(2024, 2, 29))
        );
        assert_eq!(
            Granularity::Month.period(day(2023, 12, 31)),
            (day(2023, 12, 1), day(2023, 12, 31))
        );
    }

    #[test]
    fn week_period_is_monday_to_sunday() {
        // Jan 29, 2025 is a Wednesday
        assert_eq!(
            Granularity::Week.period(day(2025, 1, 29)),
            (day(2025, 1, 27), day(2025, 2, 2))
        );
    }

    #[test]
    fn year_and_day_periods() {
        assert_eq!(
            Granularity::Year.period(day(2024, 7, 4)),
            (day(2024, 1, 1), day(2024, 12, 31))
        );
        assert_eq!(
            Granularity::Day.period(day(2024, 7, 4)),
            (day(2024, 7, 4), day(2024, 7, 4))
        );
    }

    #[test]
    fn labels() {
        let date = day(2025, 1, 1);
        assert_eq!(Granularity::Day.label(date), "2025-01-01");
        assert_eq!(Granularity::Week.label(date), "2025-W01");
        assert_eq!(Granularity::Month.label(date), "2025-01");
        assert_eq!(Granularity::Year.label(date), "2025");
    }

    #[test]
    fn iso_week_label_uses_week_year() {
        // Dec 30, 2024 belongs to ISO week 1 of 2025
        assert_eq!(Granularity::Week.label(day(2024, 12, 30)), "2025-W01");
    }

    #[test]
    fn periods_spanning_year_boundary() {
        let periods: Vec<_> = Granularity::Month
            .periods(day(2023, 11, 15), day(2024, 2, 1))
            .collect();
        assert_eq!(
            periods,
            vec![
                day(2023, 11, 1),
                day(2023, 12, 1),
                day(2024, 1, 1),
                day(2024, 2, 1)
            ]
        );
    }

    #[test]
    fn periods_empty_when_reversed() {
        assert_eq!(
            Granularity::Month
                .periods(day(2024, 3, 1), day(2024, 2, 1))
                .count(),
            0
        );
    }

    #[test]
    fn parse_and_serde() {
        assert_eq!("monthly".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("hourly".parse::<Granularity>().is_err());
        assert_eq!(
            serde_json::to_string(&Granularity::Week).unwrap(),
            "\"week\""
        );
        assert_eq!(Granularity::default(), Granularity::Month);
    }
}
