//! Notification service: listing, acknowledging and resolving alerts.

use chrono::Utc;

use crate::domain::{DustbinEvent, EventBus, Notification};
use crate::error::GatewayError;
use crate::persistence::DataSource;

/// Orchestration layer for the critical-alert lifecycle.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: DataSource,
    event_bus: EventBus,
}

impl NotificationService {
    /// Creates a new `NotificationService`.
    #[must_use]
    pub fn new(store: DataSource, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Unresolved notifications, most recent crossing first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn list_active(&self) -> Result<Vec<Notification>, GatewayError> {
        self.store.active_notifications().await
    }

    /// Acknowledges a notification.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
    pub async fn mark_read(&self, id: i64) -> Result<Notification, GatewayError> {
        self.store
            .mark_notification_read(id)
            .await?
            .ok_or(GatewayError::NotificationNotFound(id))
    }

    /// Resolves a notification on behalf of `resolver`.
    ///
    /// Resolving an already resolved notification succeeds and leaves the
    /// original resolver and time in place.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
    pub async fn resolve(
        &self,
        id: i64,
        resolver: Option<i64>,
    ) -> Result<Notification, GatewayError> {
        let now = Utc::now();
        let (note, newly_resolved) = self
            .store
            .resolve_notification(id, resolver, now)
            .await?
            .ok_or(GatewayError::NotificationNotFound(id))?;

        if newly_resolved {
            let _ = self.event_bus.publish(DustbinEvent::NotificationResolved {
                notification_id: note.id,
                resolved_by: note.resolved_by,
                timestamp: now,
            });
            tracing::info!(notification_id = id, resolved_by = ?resolver, "notification resolved");
        }
        Ok(note)
    }

    /// Deletes a notification permanently.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
    pub async fn delete(&self, id: i64) -> Result<(), GatewayError> {
        if self.store.delete_notification(id).await? {
            tracing::info!(notification_id = id, "notification deleted");
            Ok(())
        } else {
            Err(GatewayError::NotificationNotFound(id))
        }
    }

    /// Count of unread, unresolved notifications.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn unread_count(&self) -> Result<i64, GatewayError> {
        self.store.unread_notification_count().await
    }
}
