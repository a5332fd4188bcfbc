//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

/// Envelope carrying only a confirmation message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Confirmation text.
    pub message: String,
}

impl MessageResponse {
    /// Builds a successful message envelope.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Body returned for unknown routes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RouteNotFoundResponse {
    /// Always `false`.
    pub success: bool,
    /// Always `"Route not found"`.
    pub error: String,
    /// Requested path.
    pub path: String,
}
