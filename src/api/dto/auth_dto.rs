//! Authentication DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::User;

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email.
    #[serde(default)]
    pub email: Option<String>,
    /// Plain-text password.
    #[serde(default)]
    pub password: Option<String>,
}

/// Operator account as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDto {
    /// Account identifier.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role label.
    pub role: String,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
        }
    }
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Always `true`.
    pub success: bool,
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// Authenticated account.
    pub user: UserDto,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    /// Always `true`.
    pub success: bool,
    /// Authenticated account.
    pub user: UserDto,
}
