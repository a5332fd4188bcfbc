//! Notification handlers: list, count, acknowledge, resolve, delete.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, put};
use axum::{Json, Router};

use crate::api::dto::{
    MessageResponse, NotificationCountResponse, NotificationDto, NotificationListResponse,
    NotificationResponse,
};
use crate::api::extract::MaybeUser;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /notifications` — List unresolved notifications.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "List active notifications",
    description = "Unresolved critical-fill alerts, most recent crossing first.",
    responses(
        (status = 200, description = "Active notifications", body = NotificationListResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let notes = state.notification_service.list_active().await?;
    Ok(Json(NotificationListResponse {
        success: true,
        notifications: notes.into_iter().map(NotificationDto::from).collect(),
    }))
}

/// `GET /notifications/count` — Count unread notifications.
///
/// # Errors
///
/// Returns [`GatewayError`] on storage failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/count",
    tag = "Notifications",
    summary = "Count unread notifications",
    responses(
        (status = 200, description = "Unread, unresolved count", body = NotificationCountResponse),
    )
)]
pub async fn count_notifications(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, GatewayError> {
    let count = state.notification_service.unread_count().await?;
    Ok(Json(NotificationCountResponse {
        success: true,
        count,
    }))
}

/// `PUT /notifications/{id}/read` — Acknowledge a notification.
///
/// # Errors
///
/// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark notification as read",
    params(("id" = i64, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification acknowledged", body = NotificationResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let note = state
        .notification_service
        .mark_read(parse_id(&id)?)
        .await?;
    Ok(Json(NotificationResponse {
        success: true,
        message: "Notification marked as read".to_string(),
        notification: note.into(),
    }))
}

/// `PUT /notifications/{id}/resolve` — Resolve a notification.
///
/// The resolver is the authenticated caller, if any.
///
/// # Errors
///
/// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/resolve",
    tag = "Notifications",
    summary = "Resolve notification",
    description = "Moves the notification to its terminal state. Repeating the call keeps the first resolver.",
    params(("id" = i64, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification resolved", body = NotificationResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn resolve(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let note = state
        .notification_service
        .resolve(parse_id(&id)?, user.map(|u| u.id))
        .await?;
    Ok(Json(NotificationResponse {
        success: true,
        message: "Notification resolved".to_string(),
        notification: note.into(),
    }))
}

/// `DELETE /notifications/{id}` — Delete a notification.
///
/// # Errors
///
/// Returns [`GatewayError::NotificationNotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    summary = "Delete notification",
    params(("id" = i64, Path, description = "Notification identifier")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    state.notification_service.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse::new("Notification deleted")))
}

fn parse_id(raw: &str) -> Result<i64, GatewayError> {
    raw.parse()
        .map_err(|_| GatewayError::InvalidRequest(format!("Invalid notification id: {raw}")))
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/count", get(count_notifications))
        .route("/notifications/{id}", delete(delete_notification))
        .route("/notifications/{id}/read", put(mark_read))
        .route("/notifications/{id}/resolve", put(resolve))
}
