//! Request extractors that report failures in the JSON error envelope.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::app_state::AppState;
use crate::domain::User;
use crate::error::GatewayError;

/// JSON body extractor whose rejection is a 400 [`GatewayError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(&rejection)),
        }
    }
}

fn json_rejection(rejection: &JsonRejection) -> GatewayError {
    GatewayError::InvalidRequest(format!("Invalid JSON body: {}", rejection.body_text()))
}

/// Query string extractor whose rejection is a 400 [`GatewayError`].
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(&rejection)),
        }
    }
}

fn query_rejection(rejection: &QueryRejection) -> GatewayError {
    GatewayError::InvalidRequest(format!("Invalid query string: {}", rejection.body_text()))
}

/// Authenticated caller; rejects with 401 when the bearer token is
/// missing, unknown or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Account behind the token.
    pub user: User,
    /// The presented bearer token.
    pub token: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| GatewayError::Unauthorized("Authentication required".to_string()))?;
        let user = state.auth_service.authenticate(&token).await?;
        Ok(Self { user, token })
    }
}

/// Optional caller: `None` when no valid bearer token is presented.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = GatewayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Self(None));
        };
        match state.auth_service.authenticate(&token).await {
            Ok(user) => Ok(Self(Some(user))),
            Err(GatewayError::Unauthorized(_)) => Ok(Self(None)),
            Err(other) => Err(other),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder();
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let Ok(request) = builder.body(()) else {
            panic!("request");
        };
        request.into_parts().0
    }

    #[test]
    fn bearer_token_is_parsed() {
        assert_eq!(
            bearer_token(&parts_with(Some("Bearer abc123"))).as_deref(),
            Some("abc123")
        );
        assert!(bearer_token(&parts_with(Some("Basic abc"))).is_none());
        assert!(bearer_token(&parts_with(Some("Bearer   "))).is_none());
        assert!(bearer_token(&parts_with(None)).is_none());
    }
}
