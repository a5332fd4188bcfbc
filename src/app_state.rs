//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::api::rate_limit::RateLimiter;
use crate::config::GatewayConfig;
use crate::domain::EventBus;
use crate::persistence::DataSource;
use crate::service::{AnalyticsService, AuthService, DustbinService, NotificationService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fleet CRUD, renumbering and sensor ingestion.
    pub dustbin_service: Arc<DustbinService>,
    /// Critical-alert lifecycle.
    pub notification_service: Arc<NotificationService>,
    /// History aggregation.
    pub analytics_service: Arc<AnalyticsService>,
    /// Login sessions.
    pub auth_service: Arc<AuthService>,
    /// Storage backend, used directly by the health check.
    pub data_source: DataSource,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
    /// Per-client request budget for `/api/v1`.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Wires the service layer over `data_source`.
    #[must_use]
    pub fn new(config: &GatewayConfig, data_source: DataSource) -> Self {
        let event_bus = EventBus::new(config.event_bus_capacity);
        let session_ttl = chrono::Duration::hours(config.session_ttl_hours.max(1));

        Self {
            dustbin_service: Arc::new(DustbinService::new(
                data_source.clone(),
                event_bus.clone(),
            )),
            notification_service: Arc::new(NotificationService::new(
                data_source.clone(),
                event_bus.clone(),
            )),
            analytics_service: Arc::new(AnalyticsService::new(data_source.clone())),
            auth_service: Arc::new(AuthService::new(
                data_source.clone(),
                session_ttl,
                config.bcrypt_cost,
            )),
            data_source,
            event_bus,
            rate_limiter: Arc::new(
                RateLimiter::new(
                    Duration::from_secs(config.rate_limit_window_secs),
                    config.rate_limit_max_requests,
                )
                .trusting_proxy(config.trust_proxy),
            ),
        }
    }
}
