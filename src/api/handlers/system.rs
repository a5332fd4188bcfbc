//! System endpoints: health check, service index, unknown-route fallback.

use axum::extract::{OriginalUri, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::RouteNotFoundResponse;
use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// `connected` or `disconnected`.
    pub database: String,
    /// Active data source (`postgres` or `demo`).
    pub data_source: String,
    /// Check time, RFC 3339.
    pub timestamp: String,
    /// Crate version.
    pub version: String,
}

/// `GET /health` — Service and database health.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Pings the data source. Returns 503 when it is unreachable.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Data source unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, health, database) = match state.data_source.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "connected"),
        Err(err) => {
            tracing::error!(error = %err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
        }
    };
    (
        status,
        Json(HealthResponse {
            status: health.to_string(),
            database: database.to_string(),
            data_source: state.data_source.kind().to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Service index.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceIndex {
    /// Service name.
    pub name: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Main entry points.
    pub endpoints: Vec<&'static str>,
}

/// `GET /` — Lists the service entry points.
#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    summary = "Service index",
    responses(
        (status = 200, description = "Entry points", body = ServiceIndex),
    )
)]
pub async fn index_handler() -> impl IntoResponse {
    Json(ServiceIndex {
        name: "BinThere API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "/health",
            "/ws",
            "/api/v1/auth",
            "/api/v1/dustbins",
            "/api/v1/notifications",
            "/api/v1/analytics",
        ],
    })
}

/// Fallback for unmatched routes.
pub async fn not_found_handler(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFoundResponse {
            success: false,
            error: "Route not found".to_string(),
            path: uri.path().to_string(),
        }),
    )
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}
