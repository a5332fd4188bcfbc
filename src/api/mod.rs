//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! Resource endpoints are mounted under `/api/v1` behind the per-client
//! rate limiter; system endpoints live at the root.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod rate_limit;

use axum::{Router, middleware};

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(state: &AppState) -> Router<AppState> {
    let resources = handlers::routes().layer(middleware::from_fn_with_state(
        state.clone(),
        rate_limit::enforce,
    ));
    Router::new()
        .nest("/api/v1", resources)
        .merge(handlers::system::routes())
}
