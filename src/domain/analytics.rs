//! Daily aggregation of fill-level history.
//!
//! The PostgreSQL store performs the same aggregation in SQL; these
//! functions back the in-memory store and define the rounding rule both
//! follow (mean rounded half away from zero, like `ROUND(AVG(..))`).

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::dustbin::{CRITICAL_FILL_THRESHOLD, Dustbin, HistorySample, LOW_BATTERY_THRESHOLD};
use super::period::DateRange;

/// Average wet/dry fill for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAverage {
    /// Bucket day (UTC).
    pub day: NaiveDate,
    /// Rounded mean wet waste fill level.
    pub wet_waste: i32,
    /// Rounded mean dry waste fill level.
    pub dry_waste: i32,
}

/// Fleet-wide rollup for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTrend {
    /// Bucket day (UTC).
    pub day: NaiveDate,
    /// Rounded mean overall fill level.
    pub avg_fill: i32,
    /// Rounded mean wet waste fill level.
    pub avg_wet: i32,
    /// Rounded mean dry waste fill level.
    pub avg_dry: i32,
    /// Number of distinct bins that reported that day.
    pub active_dustbins: i64,
}

/// Snapshot of the active fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetSummary {
    /// Number of active bins.
    pub total_dustbins: i64,
    /// Active bins at or above the critical threshold.
    pub critical_dustbins: i64,
    /// Active bins below the low-battery threshold.
    pub low_battery_dustbins: i64,
    /// Mean overall fill level across active bins.
    pub average_fill_level: i32,
    /// Mean wet waste fill level across active bins.
    pub average_wet_waste: i32,
    /// Mean dry waste fill level across active bins.
    pub average_dry_waste: i32,
    /// Mean battery level across active bins.
    pub average_battery_level: i32,
    /// Distinct active bins with a history sample in the last 24 hours.
    pub reporting_last_24h: i64,
    /// Time of the most recent history sample, if any.
    pub latest_sample_at: Option<DateTime<Utc>>,
}

/// Rounded arithmetic mean of non-negative integer samples; 0 when empty.
#[must_use]
pub fn rounded_mean(sum: i64, count: i64) -> i32 {
    if count <= 0 {
        return 0;
    }
    let rounded = (2 * sum + count) / (2 * count);
    i32::try_from(rounded).unwrap_or(i32::MAX)
}

#[derive(Default)]
struct Accumulator {
    overall: i64,
    wet: i64,
    dry: i64,
    count: i64,
    bins: HashSet<String>,
}

impl Accumulator {
    fn add(&mut self, sample: &HistorySample) {
        self.overall += i64::from(sample.overall_fill_level);
        self.wet += i64::from(sample.wet_waste_fill_level);
        self.dry += i64::from(sample.dry_waste_fill_level);
        self.count += 1;
        self.bins.insert(sample.dustbin_id.as_str().to_string());
    }
}

fn group_by_day<'a>(
    samples: impl IntoIterator<Item = &'a HistorySample>,
) -> BTreeMap<NaiveDate, Accumulator> {
    let mut days: BTreeMap<NaiveDate, Accumulator> = BTreeMap::new();
    for sample in samples {
        days.entry(sample.timestamp.date_naive())
            .or_default()
            .add(sample);
    }
    days
}

/// Buckets samples inside `range` by day, ascending.
pub fn daily_averages<'a>(
    samples: impl IntoIterator<Item = &'a HistorySample>,
    range: &DateRange,
) -> Vec<DailyAverage> {
    group_by_day(samples.into_iter().filter(|s| range.contains(s.timestamp)))
        .into_iter()
        .map(|(day, acc)| DailyAverage {
            day,
            wet_waste: rounded_mean(acc.wet, acc.count),
            dry_waste: rounded_mean(acc.dry, acc.count),
        })
        .collect()
}

/// Daily rollups for samples at or after `since`, newest day first.
pub fn daily_trends<'a>(
    samples: impl IntoIterator<Item = &'a HistorySample>,
    since: DateTime<Utc>,
) -> Vec<DailyTrend> {
    group_by_day(samples.into_iter().filter(|s| s.timestamp >= since))
        .into_iter()
        .rev()
        .map(|(day, acc)| DailyTrend {
            day,
            avg_fill: rounded_mean(acc.overall, acc.count),
            avg_wet: rounded_mean(acc.wet, acc.count),
            avg_dry: rounded_mean(acc.dry, acc.count),
            active_dustbins: i64::try_from(acc.bins.len()).unwrap_or(i64::MAX),
        })
        .collect()
}

impl FleetSummary {
    /// Computes the summary from the active fleet and its history.
    ///
    /// Only samples attributed to an active bin count as reporting; history
    /// left behind by retired bins still moves `latest_sample_at`.
    pub fn compute<'a>(
        active: &[Dustbin],
        history: impl IntoIterator<Item = &'a HistorySample>,
        now: DateTime<Utc>,
    ) -> Self {
        let count = i64::try_from(active.len()).unwrap_or(i64::MAX);
        let sum = |f: fn(&Dustbin) -> i32| active.iter().map(|b| i64::from(f(b))).sum::<i64>();
        let tally = |pred: fn(&Dustbin) -> bool| {
            i64::try_from(active.iter().filter(|b| pred(b)).count()).unwrap_or(i64::MAX)
        };

        let cutoff = now - Duration::hours(24);
        let active_ids: HashSet<&str> = active.iter().map(|b| b.id.as_str()).collect();
        let mut reporting = HashSet::new();
        let mut latest: Option<DateTime<Utc>> = None;
        for sample in history {
            if sample.timestamp >= cutoff && active_ids.contains(sample.dustbin_id.as_str()) {
                reporting.insert(sample.dustbin_id.as_str().to_string());
            }
            latest = latest.max(Some(sample.timestamp));
        }

        Self {
            total_dustbins: count,
            critical_dustbins: tally(|b| b.overall_fill_level >= CRITICAL_FILL_THRESHOLD),
            low_battery_dustbins: tally(|b| b.battery_level < LOW_BATTERY_THRESHOLD),
            average_fill_level: rounded_mean(sum(|b| b.overall_fill_level), count),
            average_wet_waste: rounded_mean(sum(|b| b.wet_waste_fill_level), count),
            average_dry_waste: rounded_mean(sum(|b| b.dry_waste_fill_level), count),
            average_battery_level: rounded_mean(sum(|b| b.battery_level), count),
            reporting_last_24h: i64::try_from(reporting.len()).unwrap_or(i64::MAX),
            latest_sample_at: latest,
        }
    }
}
