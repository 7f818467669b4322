//! # Report Windows
//!
//! Resolves report parameters into an inclusive UTC time window.
//!
//! ## Window Shapes
//! ```text
//! anchor = Wed 2024-03-06
//!
//! daily    [2024-03-06 00:00:00.000, 2024-03-06 23:59:59.999]
//! weekly   [2024-03-03 00:00:00.000, 2024-03-09 23:59:59.999]   Sun..Sat
//! monthly  [2024-03-01 00:00:00.000, 2024-03-31 23:59:59.999]
//! yearly   [2024-01-01 00:00:00.000, 2024-12-31 23:59:59.999]
//! range    [start 00:00:00.000,      end 23:59:59.999]
//! ```
//!
//! Day boundaries are UTC. Nothing here reads the clock: callers pass
//! `today` in.

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::validation::parse_day;

// =============================================================================
// Period
// =============================================================================

/// Calendar period of a sales report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            _ => Err(CoreError::invalid("Invalid period specified")),
        }
    }
}

// =============================================================================
// Date Window
// =============================================================================

/// Inclusive time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// 00:00:00.000 UTC of the day.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// 23:59:59.999 UTC of the day.
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::milliseconds(1)
}

fn out_of_range() -> CoreError {
    CoreError::invalid("date is out of range")
}

impl DateWindow {
    /// One full calendar day.
    pub fn day(day: NaiveDate) -> Self {
        DateWindow {
            start: start_of_day(day),
            end: end_of_day(day),
        }
    }

    /// Full days `first..=last`. Fails when `first` is after `last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> CoreResult<Self> {
        if first > last {
            return Err(CoreError::invalid("startDate must not be after endDate"));
        }
        Ok(DateWindow {
            start: start_of_day(first),
            end: end_of_day(last),
        })
    }

    /// The calendar period containing `anchor`.
    ///
    /// Weeks run Sunday through Saturday.
    pub fn for_period(period: Period, anchor: NaiveDate) -> CoreResult<Self> {
        let (first, last) = match period {
            Period::Daily => (anchor, anchor),
            Period::Weekly => {
                let back = u64::from(anchor.weekday().num_days_from_sunday());
                let sunday = anchor.checked_sub_days(Days::new(back)).ok_or_else(out_of_range)?;
                let saturday = sunday.checked_add_days(Days::new(6)).ok_or_else(out_of_range)?;
                (sunday, saturday)
            }
            Period::Monthly => {
                let first = anchor.with_day(1).ok_or_else(out_of_range)?;
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(out_of_range)?;
                (first, last)
            }
            Period::Yearly => {
                let first = NaiveDate::from_ymd_opt(anchor.year(), 1, 1).ok_or_else(out_of_range)?;
                let last = NaiveDate::from_ymd_opt(anchor.year(), 12, 31).ok_or_else(out_of_range)?;
                (first, last)
            }
        };
        DateWindow::days(first, last)
    }

    /// Optional bounds: start defaults to the epoch, end to the end of `today`.
    pub fn open(first: Option<NaiveDate>, last: Option<NaiveDate>, today: NaiveDate) -> CoreResult<Self> {
        let start = match first {
            Some(day) => start_of_day(day),
            None => DateTime::UNIX_EPOCH,
        };
        let end = end_of_day(last.unwrap_or(today));

        if start > end {
            return Err(CoreError::invalid("startDate must not be after endDate"));
        }
        Ok(DateWindow { start, end })
    }

    /// Whether the instant falls inside the window (both ends inclusive).
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

// =============================================================================
// Report Window Request
// =============================================================================

/// How a sales report selects its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    Period { period: Period, anchor: NaiveDate },
    Range { first: NaiveDate, last: NaiveDate },
}

impl WindowSpec {
    /// Builds the spec from raw query parameters.
    ///
    /// Range mode wins when `startDate` or `endDate` is present, and then
    /// both are required. Otherwise `period` is required and `date`
    /// defaults to `today`.
    pub fn from_params(
        period: Option<&str>,
        date: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
        today: NaiveDate,
    ) -> CoreResult<Self> {
        if start_date.is_some() || end_date.is_some() {
            let first = parse_day("startDate", start_date.unwrap_or_default())?;
            let last = parse_day("endDate", end_date.unwrap_or_default())?;
            return Ok(WindowSpec::Range { first, last });
        }

        let period: Period = period
            .ok_or_else(|| CoreError::invalid("Invalid period specified"))?
            .parse()?;
        let anchor = match date {
            Some(date) => parse_day("date", date)?,
            None => today,
        };
        Ok(WindowSpec::Period { period, anchor })
    }

    pub fn period(&self) -> Option<Period> {
        match self {
            WindowSpec::Period { period, .. } => Some(*period),
            WindowSpec::Range { .. } => None,
        }
    }

    pub fn resolve(&self) -> CoreResult<DateWindow> {
        match *self {
            WindowSpec::Period { period, anchor } => DateWindow::for_period(period, anchor),
            WindowSpec::Range { first, last } => DateWindow::days(first, last),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_daily_window_covers_full_day() {
        let window = DateWindow::for_period(Period::Daily, ymd(2024, 3, 6)).unwrap();
        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 6, 0, 0, 0).unwrap());
        assert_eq!(window.end.date_naive(), ymd(2024, 3, 6));
        assert_eq!(window.end.hour(), 23);
        assert_eq!(window.end.minute(), 59);
        assert_eq!(window.end.second(), 59);
        assert_eq!(window.end.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn test_weekly_window_is_sunday_to_saturday() {
        // 2024-03-06 is a Wednesday
        let window = DateWindow::for_period(Period::Weekly, ymd(2024, 3, 6)).unwrap();
        assert_eq!(window.start, start_of_day(ymd(2024, 3, 3)));
        assert_eq!(window.end, end_of_day(ymd(2024, 3, 9)));

        assert!(window.contains(start_of_day(ymd(2024, 3, 3))));
        assert!(window.contains(end_of_day(ymd(2024, 3, 9))));
        assert!(!window.contains(end_of_day(ymd(2024, 3, 2))));
        assert!(!window.contains(start_of_day(ymd(2024, 3, 10))));
    }

    #[test]
    fn test_weekly_window_anchored_on_sunday_starts_that_day() {
        let window = DateWindow::for_period(Period::Weekly, ymd(2024, 3, 3)).unwrap();
        assert_eq!(window.start, start_of_day(ymd(2024, 3, 3)));
    }

    #[test]
    fn test_monthly_window_handles_leap_february() {
        let window = DateWindow::for_period(Period::Monthly, ymd(2024, 2, 14)).unwrap();
        assert_eq!(window.start, start_of_day(ymd(2024, 2, 1)));
        assert_eq!(window.end, end_of_day(ymd(2024, 2, 29)));

        let december = DateWindow::for_period(Period::Monthly, ymd(2023, 12, 31)).unwrap();
        assert_eq!(december.end, end_of_day(ymd(2023, 12, 31)));
    }

    #[test]
    fn test_yearly_window() {
        let window = DateWindow::for_period(Period::Yearly, ymd(2024, 7, 4)).unwrap();
        assert_eq!(window.start, start_of_day(ymd(2024, 1, 1)));
        assert_eq!(window.end, end_of_day(ymd(2024, 12, 31)));
    }

    #[test]
    fn test_range_rejects_reversed_bounds() {
        assert!(DateWindow::days(ymd(2024, 3, 2), ymd(2024, 3, 1)).is_err());
        let same = DateWindow::days(ymd(2024, 3, 1), ymd(2024, 3, 1)).unwrap();
        assert_eq!(same, DateWindow::day(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_open_window_defaults() {
        let today = ymd(2024, 3, 6);
        let window = DateWindow::open(None, None, today).unwrap();
        assert_eq!(window.start.timestamp(), 0);
        assert_eq!(window.end, end_of_day(today));
    }

    #[test]
    fn test_window_spec_from_params() {
        let today = ymd(2024, 3, 6);

        let spec = WindowSpec::from_params(Some("weekly"), None, None, None, today).unwrap();
        assert_eq!(spec, WindowSpec::Period { period: Period::Weekly, anchor: today });

        let spec = WindowSpec::from_params(None, None, Some("2024-01-01"), Some("2024-01-31"), today).unwrap();
        assert_eq!(spec.period(), None);
        assert_eq!(spec.resolve().unwrap().end, end_of_day(ymd(2024, 1, 31)));

        assert!(WindowSpec::from_params(Some("hourly"), None, None, None, today).is_err());
        assert!(WindowSpec::from_params(None, None, None, None, today).is_err());
        assert!(WindowSpec::from_params(None, None, Some("2024-01-01"), None, today).is_err());
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("monthly".parse::<Period>().unwrap(), Period::Monthly);
        let err = "fortnightly".parse::<Period>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }
}
