//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Days, Duration, Local, NaiveDate};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Pre-compiled regex for relative day parsing.
static RELATIVE_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a timestamp string as either RFC 3339 or relative time.
///
/// Supports:
/// - RFC 3339: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_timestamp(s: &str, now: DateTime<Local>) -> anyhow::Result<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local));
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(s.trim()) else {
        anyhow::bail!(
            "Invalid timestamp: {s}. Use RFC 3339 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    // Safe to create Duration now that we've validated the range
    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Parse a calendar day.
///
/// Supports "YYYY-MM-DD", "today", "yesterday", "N days ago" and "N weeks ago".
pub fn parse_day(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match s.trim() {
        "today" => return Ok(today),
        "yesterday" => {
            return today
                .checked_sub_days(Days::new(1))
                .context("date out of range");
        }
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DAY_RE.captures(s.trim()) else {
        anyhow::bail!("Invalid date: {s}. Use YYYY-MM-DD, 'today', 'yesterday' or 'N days ago'");
    };
    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };
    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("date out of range: {s}"))
}

/// Formats milliseconds as hours and minutes, or seconds below a minute.
pub fn format_duration(ms: u64) -> String {
    if ms < 60_000 {
        return format!("{}s", ms / 1000);
    }
    let total_minutes = ms / 60_000;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let parsed = parse_timestamp("2024-03-05T09:30:00Z", now()).unwrap();
        assert_eq!(
            parsed,
            DateTime::parse_from_rfc3339("2024-03-05T09:30:00Z").unwrap()
        );
    }

    #[test]
    fn test_parse_timestamp_relative() {
        assert_eq!(
            parse_timestamp("2 hours ago", now()).unwrap(),
            now() - Duration::hours(2)
        );
        assert_eq!(
            parse_timestamp("1 week ago", now()).unwrap(),
            now() - Duration::weeks(1)
        );
        assert_eq!(
            parse_timestamp("30 minutes ago", now()).unwrap(),
            now() - Duration::minutes(30)
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday-ish", now()).is_err());
        assert!(parse_timestamp("2 fortnights ago", now()).is_err());
        assert!(parse_timestamp("-1 hours ago", now()).is_err());
        assert!(parse_timestamp("+2 hours ago", now()).is_err());
        assert!(parse_timestamp("2 hours", now()).is_err());
        assert!(parse_timestamp("999999999999 weeks ago", now()).is_err());
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("today", today()).unwrap(), today());
        assert_eq!(
            parse_day("yesterday", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
        );
        assert_eq!(
            parse_day("2024-02-29", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_day("5 days ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            parse_day("1 week ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 27).unwrap()
        );
    }

    #[test]
    fn test_parse_day_rejects_garbage() {
        assert!(parse_day("2024-02-30", today()).is_err());
        assert!(parse_day("3 hours ago", today()).is_err());
        assert!(parse_day("someday", today()).is_err());
        assert!(parse_day("+5 days ago", today()).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(42_500), "42s");
        assert_eq!(format_duration(60_000), "1m");
        assert_eq!(format_duration(3_600_000), "1h 0m");
        assert_eq!(format_duration(5_430_000), "1h 30m");
    }
}
