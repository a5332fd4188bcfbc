//! REST endpoint handlers organized by resource.

pub mod analytics;
pub mod auth;
pub mod dustbin;
pub mod notification;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(dustbin::routes())
        .merge(notification::routes())
        .merge(analytics::routes())
}
