//! Analytics handlers: period series, summary and trends.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    AnalyticsPointDto, AnalyticsQuery, AnalyticsResponse, SummaryResponse, TrendDto, TrendsQuery,
    TrendsResponse,
};
use crate::api::extract::ApiQuery;
use crate::app_state::AppState;
use crate::domain::DustbinId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /analytics` — Daily wet/dry averages for a period.
///
/// # Errors
///
/// Returns [`GatewayError`] 400 for a missing or unknown period.
#[utoipa::path(
    get,
    path = "/api/v1/analytics",
    tag = "Analytics",
    summary = "Fill-level series",
    description = "Buckets history by UTC day inside the period and averages wet and dry fill levels, optionally for one bin. Days without samples are omitted.",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Daily series, ascending", body = AnalyticsResponse),
        (status = 400, description = "Missing or invalid period", body = ErrorResponse),
    )
)]
pub async fn series(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let dustbin = query
        .dustbin_id
        .filter(|id| !id.is_empty())
        .map(DustbinId::from_raw);
    let (period, points) = state
        .analytics_service
        .series(query.period.as_deref(), dustbin.as_ref())
        .await?;
    Ok(Json(AnalyticsResponse {
        success: true,
        period: period.to_string(),
        dustbin_id: dustbin.map(DustbinId::into_inner),
        data: points.iter().map(AnalyticsPointDto::from).collect(),
    }))
}

/// `GET /analytics/summary` — Fleet snapshot.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/summary",
    tag = "Analytics",
    summary = "Fleet summary",
    responses(
        (status = 200, description = "Fleet rollup", body = SummaryResponse),
    )
)]
pub async fn summary(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    let summary = state.analytics_service.summary().await?;
    Ok(Json(SummaryResponse {
        success: true,
        summary: summary.into(),
    }))
}

/// `GET /analytics/trends` — Daily fleet rollups.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/analytics/trends",
    tag = "Analytics",
    summary = "Daily trends",
    params(TrendsQuery),
    responses(
        (status = 200, description = "Daily rollups, newest first", body = TrendsResponse),
        (status = 400, description = "Malformed query", body = ErrorResponse),
    )
)]
pub async fn trends(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TrendsQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let (days, trends) = state.analytics_service.trends(query.days).await?;
    Ok(Json(TrendsResponse {
        days,
        success: true,
        trends: trends.iter().map(TrendDto::from).collect(),
    }))
}

/// Analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics", get(series))
        .route("/analytics/summary", get(summary))
        .route("/analytics/trends", get(trends))
}
