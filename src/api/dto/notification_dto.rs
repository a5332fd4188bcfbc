//! Notification DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Notification;

/// A critical-fill alert as presented to the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    /// Notification identifier.
    pub id: i64,
    /// Current identifier of the bin.
    pub dustbin_id: String,
    /// Bin name when the alert was raised.
    pub dustbin_name: String,
    /// Bin location when the alert was raised.
    pub dustbin_location: String,
    /// Overall fill level when the alert was raised.
    pub fill_level: i32,
    /// Crossing instant.
    pub critical_timestamp: DateTime<Utc>,
    /// Acknowledged flag.
    pub is_read: bool,
    /// Resolved flag.
    pub is_resolved: bool,
    /// Resolving user.
    pub resolved_by: Option<i64>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            dustbin_id: n.dustbin_id.into_inner(),
            dustbin_name: n.dustbin_name,
            dustbin_location: n.dustbin_location,
            fill_level: n.fill_level,
            critical_timestamp: n.critical_timestamp,
            is_read: n.is_read,
            is_resolved: n.is_resolved,
            resolved_by: n.resolved_by,
            resolved_at: n.resolved_at,
            created_at: n.created_at,
        }
    }
}

/// Response body for `GET /notifications`.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// Always `true`.
    pub success: bool,
    /// Unresolved notifications, most recent crossing first.
    pub notifications: Vec<NotificationDto>,
}

/// Response body for notification mutations.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    /// Always `true`.
    pub success: bool,
    /// Confirmation text.
    pub message: String,
    /// Notification after the change.
    pub notification: NotificationDto,
}

/// Response body for `GET /notifications/count`.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationCountResponse {
    /// Always `true`.
    pub success: bool,
    /// Unread, unresolved notifications.
    pub count: i64,
}
