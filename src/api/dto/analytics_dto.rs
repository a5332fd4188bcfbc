//! Analytics DTOs: period series, fleet summary and trends.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::analytics::{DailyAverage, DailyTrend, FleetSummary};

/// Query string of `GET /analytics`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// `last-week`, `last-month` or `month-N` (0 = current month).
    pub period: Option<String>,
    /// Restrict the series to one bin.
    pub dustbin_id: Option<String>,
}

/// Query string of `GET /analytics/trends`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TrendsQuery {
    /// Number of days, 1–365 (default 7).
    pub days: Option<i64>,
}

/// One day of the analytics series.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPointDto {
    /// Chart label (`"Oct 27"`).
    pub date: String,
    /// Rounded mean wet waste fill level.
    pub wet_waste: i32,
    /// Rounded mean dry waste fill level.
    pub dry_waste: i32,
    /// Start of the bucket day (UTC).
    pub timestamp: DateTime<Utc>,
}

impl From<&DailyAverage> for AnalyticsPointDto {
    fn from(avg: &DailyAverage) -> Self {
        Self {
            date: chart_label(avg.day),
            wet_waste: avg.wet_waste,
            dry_waste: avg.dry_waste,
            timestamp: start_of(avg.day),
        }
    }
}

/// Response body for `GET /analytics`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    /// Always `true`.
    pub success: bool,
    /// Normalised period selector.
    pub period: String,
    /// Bin filter, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dustbin_id: Option<String>,
    /// Daily points, ascending.
    pub data: Vec<AnalyticsPointDto>,
}

/// Fleet summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDto {
    /// Active bins.
    pub total_dustbins: i64,
    /// Bins at or above 80% overall fill.
    pub critical_dustbins: i64,
    /// Bins below 20% battery.
    pub low_battery_dustbins: i64,
    /// Mean overall fill level.
    pub average_fill_level: i32,
    /// Mean wet waste fill level.
    pub average_wet_waste: i32,
    /// Mean dry waste fill level.
    pub average_dry_waste: i32,
    /// Mean battery level.
    pub average_battery_level: i32,
    /// Distinct active bins reporting in the last 24 hours.
    pub reporting_last_24h: i64,
    /// Most recent history sample.
    pub latest_sample_at: Option<DateTime<Utc>>,
}

impl From<FleetSummary> for SummaryDto {
    fn from(s: FleetSummary) -> Self {
        Self {
            total_dustbins: s.total_dustbins,
            critical_dustbins: s.critical_dustbins,
            low_battery_dustbins: s.low_battery_dustbins,
            average_fill_level: s.average_fill_level,
            average_wet_waste: s.average_wet_waste,
            average_dry_waste: s.average_dry_waste,
            average_battery_level: s.average_battery_level,
            reporting_last_24h: s.reporting_last_24h,
            latest_sample_at: s.latest_sample_at,
        }
    }
}

/// Response body for `GET /analytics/summary`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    /// Always `true`.
    pub success: bool,
    /// Fleet rollup.
    pub summary: SummaryDto,
}

/// One day of the trends rollup.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrendDto {
    /// Calendar day (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Chart label (`"Oct 27"`).
    pub label: String,
    /// Rounded mean overall fill level.
    pub avg_fill: i32,
    /// Rounded mean wet waste fill level.
    pub avg_wet: i32,
    /// Rounded mean dry waste fill level.
    pub avg_dry: i32,
    /// Distinct bins that reported.
    pub active_dustbins: i64,
}

impl From<&DailyTrend> for TrendDto {
    fn from(t: &DailyTrend) -> Self {
        Self {
            date: t.day,
            label: chart_label(t.day),
            avg_fill: t.avg_fill,
            avg_wet: t.avg_wet,
            avg_dry: t.avg_dry,
            active_dustbins: t.active_dustbins,
        }
    }
}

/// Response body for `GET /analytics/trends`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrendsResponse {
    /// Effective window after clamping.
    pub days: u32,
    /// Always `true`.
    pub success: bool,
    /// Daily rollups, newest first.
    pub trends: Vec<TrendDto>,
}

fn chart_label(day: NaiveDate) -> String {
    day.format("%b %d").to_string()
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}
