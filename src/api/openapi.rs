//! OpenAPI description of the REST surface.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::handlers::{analytics, auth, dustbin, notification, system};

/// Generated OpenAPI document, served at `/api-docs/openapi.json`.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "BinThere API",
        description = "Fleet management, critical-fill alerts and fill-level analytics for smart dustbins."
    ),
    paths(
        system::health_handler,
        system::index_handler,
        auth::login,
        auth::logout,
        auth::me,
        dustbin::list_dustbins,
        dustbin::get_dustbin,
        dustbin::create_dustbin,
        dustbin::update_dustbin,
        dustbin::remove_dustbins,
        dustbin::update_fill_level,
        notification::list_notifications,
        notification::count_notifications,
        notification::mark_read,
        notification::resolve,
        notification::delete_notification,
        analytics::series,
        analytics::summary,
        analytics::trends,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "System", description = "Health and service metadata"),
        (name = "Auth", description = "Operator sessions"),
        (name = "Dustbins", description = "Fleet inventory and sensor ingestion"),
        (name = "Notifications", description = "Critical-fill alerts"),
        (name = "Analytics", description = "Fill-level history aggregation"),
    )
)]
pub struct ApiDoc;

#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
