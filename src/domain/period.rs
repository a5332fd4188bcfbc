//! Analytics period selectors and their resolved date ranges.
//!
//! The selector string (`"last-week"`, `"last-month"`, `"month-N"`) is parsed
//! into a closed [`AnalyticsPeriod`] and resolved against a reference instant
//! into a half-open UTC [`DateRange`] that is bound as query parameters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};

use crate::error::GatewayError;

/// Time window for the analytics series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsPeriod {
    /// Rolling 7 days ending now.
    LastWeek,
    /// Rolling 30 days ending now.
    LastMonth,
    /// The calendar month `n` months before the current one (0 = current).
    Month(u32),
}

/// Half-open `[start, end)` interval in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound.
    pub start: DateTime<Utc>,
    /// Exclusive upper bound.
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Returns `true` if `t` lies inside the range.
    #[must_use]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}

impl AnalyticsPeriod {
    /// Resolves the period against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPeriod`] when `month-N` reaches before
    /// the representable calendar.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<DateRange, GatewayError> {
        match self {
            Self::LastWeek => Ok(DateRange {
                start: now - Duration::days(7),
                end: now,
            }),
            Self::LastMonth => Ok(DateRange {
                start: now - Duration::days(30),
                end: now,
            }),
            Self::Month(months_ago) => {
                let first_of_current = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
                    .ok_or_else(|| GatewayError::Internal("invalid current date".to_string()))?;
                let out_of_range = || GatewayError::InvalidPeriod(self.to_string());
                let first = first_of_current
                    .checked_sub_months(Months::new(months_ago))
                    .ok_or_else(out_of_range)?;
                let next = first
                    .checked_add_months(Months::new(1))
                    .ok_or_else(out_of_range)?;
                Ok(DateRange {
                    start: start_of_day(first),
                    end: start_of_day(next),
                })
            }
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

impl FromStr for AnalyticsPeriod {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-week" => Ok(Self::LastWeek),
            "last-month" => Ok(Self::LastMonth),
            other => other
                .strip_prefix("month-")
                .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|n| n.parse().ok())
                .map(Self::Month)
                .ok_or_else(|| GatewayError::InvalidPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for AnalyticsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LastWeek => f.write_str("last-week"),
            Self::LastMonth => f.write_str("last-month"),
            Self::Month(n) => write!(f, "month-{n}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        let Some(t) = Utc.with_ymd_and_hms(y, m, d, h, 0, 0).single() else {
            panic!("valid instant");
        };
        t
    }

    fn parse(s: &str) -> AnalyticsPeriod {
        let Ok(p) = s.parse() else {
            panic!("{s} should parse");
        };
        p
    }

    #[test]
    fn parses_known_selectors() {
        assert_eq!(parse("last-week"), AnalyticsPeriod::LastWeek);
        assert_eq!(parse("last-month"), AnalyticsPeriod::LastMonth);
        assert_eq!(parse("month-0"), AnalyticsPeriod::Month(0));
        assert_eq!(parse("month-13"), AnalyticsPeriod::Month(13));
    }

    #[test]
    fn rejects_unknown_selectors() {
        for bad in ["", "invalid", "month-", "month-x", "month--1", "LAST-WEEK", "month-1a"] {
            assert!(bad.parse::<AnalyticsPeriod>().is_err(), "{bad} accepted");
        }
    }

    #[test]
    fn rolling_windows_end_now() {
        let now = at(2025, 10, 27, 12);
        let Ok(week) = AnalyticsPeriod::LastWeek.resolve(now) else {
            panic!("resolves");
        };
        assert_eq!(week.end, now);
        assert_eq!(week.start, at(2025, 10, 20, 12));

        let Ok(month) = AnalyticsPeriod::LastMonth.resolve(now) else {
            panic!("resolves");
        };
        assert_eq!(month.start, at(2025, 9, 27, 12));
    }

    #[test]
    fn calendar_month_bounds() {
        let now = at(2025, 3, 15, 9);
        let Ok(current) = AnalyticsPeriod::Month(0).resolve(now) else {
            panic!("resolves");
        };
        assert_eq!(current.start, at(2025, 3, 1, 0));
        assert_eq!(current.end, at(2025, 4, 1, 0));

        let Ok(feb) = AnalyticsPeriod::Month(1).resolve(now) else {
            panic!("resolves");
        };
        assert_eq!(feb.start, at(2025, 2, 1, 0));
        assert_eq!(feb.end, at(2025, 3, 1, 0));
    }

    #[test]
    fn months_beyond_a_year_cross_into_previous_years() {
        let now = at(2025, 3, 15, 9);
        let Ok(range) = AnalyticsPeriod::Month(13).resolve(now) else {
            panic!("resolves");
        };
        assert_eq!(range.start, at(2024, 2, 1, 0));
        assert_eq!(range.end, at(2024, 3, 1, 0));
    }

    #[test]
    fn range_is_half_open() {
        let range = DateRange {
            start: at(2025, 1, 1, 0),
            end: at(2025, 1, 2, 0),
        };
        assert!(range.contains(at(2025, 1, 1, 0)));
        assert!(!range.contains(at(2025, 1, 2, 0)));
    }

    #[test]
    fn display_round_trips_selector() {
        assert_eq!(AnalyticsPeriod::Month(4).to_string(), "month-4");
        assert_eq!(AnalyticsPeriod::LastWeek.to_string(), "last-week");
    }
}
