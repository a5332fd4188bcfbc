//! Authentication handlers: login, logout, current user.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CurrentUserResponse, LoginRequest, LoginResponse, MessageResponse};
use crate::api::extract::{ApiJson, CurrentUser};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /auth/login` — Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for blank fields and
/// [`GatewayError::Unauthorized`] for bad credentials.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    summary = "Log in",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session opened", body = LoginResponse),
        (status = 400, description = "Email or password missing", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let (session, user) = state
        .auth_service
        .login(req.email.as_deref(), req.password.as_deref())
        .await?;
    Ok(Json(LoginResponse {
        success: true,
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
    }))
}

/// `POST /auth/logout` — Revoke the presented token.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    summary = "Log out",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, GatewayError> {
    state.auth_service.logout(&current.token).await?;
    tracing::info!(user_id = current.user.id, "session closed");
    Ok(Json(MessageResponse::new("Logged out")))
}

/// `GET /auth/me` — Current account.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid token.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    summary = "Current user",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated account", body = CurrentUserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    )
)]
pub async fn me(current: CurrentUser) -> impl IntoResponse {
    Json(CurrentUserResponse {
        success: true,
        user: current.user.into(),
    })
}

/// Authentication routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}
