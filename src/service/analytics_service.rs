//! Analytics service: period series, fleet summary and daily trends.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::domain::analytics::{DailyAverage, DailyTrend, FleetSummary};
use crate::domain::{AnalyticsPeriod, DustbinId};
use crate::error::GatewayError;
use crate::persistence::DataSource;

/// Default number of days returned by the trends rollup.
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Largest accepted trends window.
pub const MAX_TREND_DAYS: u32 = 365;

/// Read-only aggregation over the fill-level history.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    store: DataSource,
}

impl AnalyticsService {
    /// Creates a new `AnalyticsService`.
    #[must_use]
    pub fn new(store: DataSource) -> Self {
        Self { store }
    }

    /// Daily wet/dry averages for the selected period, ascending by day.
    ///
    /// A period or bin without samples yields an empty series.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when no period is given and
    /// [`GatewayError::InvalidPeriod`] when it is not recognised.
    pub async fn series(
        &self,
        period: Option<&str>,
        dustbin: Option<&DustbinId>,
    ) -> Result<(AnalyticsPeriod, Vec<DailyAverage>), GatewayError> {
        let Some(raw) = period.filter(|p| !p.is_empty()) else {
            return Err(GatewayError::InvalidRequest(
                "period query parameter is required".to_string(),
            ));
        };
        let period: AnalyticsPeriod = raw.parse()?;
        let range = period.resolve(Utc::now())?;
        let series = self.store.daily_averages(&range, dustbin).await?;
        tracing::debug!(%period, points = series.len(), "analytics series computed");
        Ok((period, series))
    }

    /// Snapshot of the active fleet.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn summary(&self) -> Result<FleetSummary, GatewayError> {
        self.store.fleet_summary(Utc::now()).await
    }

    /// Daily rollups covering today and the `days - 1` days before it,
    /// newest first. `days` defaults to 7 and is clamped to 1–365.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn trends(&self, days: Option<i64>) -> Result<(u32, Vec<DailyTrend>), GatewayError> {
        let days = clamp_days(days);
        let since = trend_window_start(Utc::now(), days);
        let trends = self.store.daily_trends(since).await?;
        Ok((days, trends))
    }
}

fn clamp_days(days: Option<i64>) -> u32 {
    days.map_or(DEFAULT_TREND_DAYS, |d| {
        u32::try_from(d.clamp(1, i64::from(MAX_TREND_DAYS))).unwrap_or(DEFAULT_TREND_DAYS)
    })
}

/// Midnight UTC of the first day in a `days`-long window ending today.
fn trend_window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    today - Duration::days(i64::from(days.saturating_sub(1)))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use chrono::TimeZone;

    fn service() -> AnalyticsService {
        AnalyticsService::new(DataSource::Memory(MemoryStore::seeded(Utc::now())))
    }

    #[test]
    fn days_are_clamped() {
        assert_eq!(clamp_days(None), 7);
        assert_eq!(clamp_days(Some(0)), 1);
        assert_eq!(clamp_days(Some(-4)), 1);
        assert_eq!(clamp_days(Some(30)), 30);
        assert_eq!(clamp_days(Some(10_000)), 365);
    }

    #[test]
    fn window_starts_at_midnight() {
        let Some(now) = Utc.with_ymd_and_hms(2025, 10, 27, 15, 30, 0).single() else {
            panic!("valid instant");
        };
        let Some(expected) = Utc.with_ymd_and_hms(2025, 10, 21, 0, 0, 0).single() else {
            panic!("valid instant");
        };
        assert_eq!(trend_window_start(now, 7), expected);
    }

    #[tokio::test]
    async fn missing_or_invalid_period_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.series(None, None).await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(matches!(
            svc.series(Some("invalid"), None).await,
            Err(GatewayError::InvalidPeriod(_))
        ));
    }

    #[tokio::test]
    async fn month_beyond_a_year_still_runs() {
        let svc = service();
        assert!(svc.series(Some("month-13"), None).await.is_ok());
    }

    #[tokio::test]
    async fn bin_without_history_gives_empty_series() {
        let svc = service();
        let Ok((period, series)) = svc
            .series(Some("last-week"), Some(&DustbinId::from_position(42)))
            .await
        else {
            panic!("series");
        };
        assert_eq!(period, AnalyticsPeriod::LastWeek);
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn last_week_series_is_ascending() {
        let svc = service();
        let Ok((_, series)) = svc.series(Some("last-week"), None).await else {
            panic!("series");
        };
        assert!(!series.is_empty());
        assert!(series.windows(2).all(|w| matches!(w, [a, b] if a.day < b.day)));
    }

    #[tokio::test]
    async fn trends_cover_requested_days() {
        let svc = service();
        let Ok((days, trends)) = svc.trends(Some(3)).await else {
            panic!("trends");
        };
        assert_eq!(days, 3);
        assert!(trends.len() <= 3);
        assert!(trends.iter().all(|t| t.active_dustbins <= 8));
    }
}
