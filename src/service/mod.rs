//! Service layer: business logic orchestration.
//!
//! Each service validates input, calls the [`crate::persistence::DataSource`]
//! and emits events through the [`super::domain::EventBus`].

pub mod analytics_service;
pub mod auth_service;
pub mod dustbin_service;
pub mod notification_service;

pub use analytics_service::AnalyticsService;
pub use auth_service::AuthService;
pub use dustbin_service::DustbinService;
pub use notification_service::NotificationService;
