//! Authentication service: bcrypt credentials and opaque session tokens.

use chrono::{Duration, Utc};

use crate::domain::user::normalize_email;
use crate::domain::{Session, User};
use crate::error::GatewayError;
use crate::persistence::DataSource;

/// Role given to the bootstrap account.
pub const ADMIN_ROLE: &str = "admin";

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Issues, resolves and revokes login sessions.
#[derive(Debug, Clone)]
pub struct AuthService {
    store: DataSource,
    session_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Creates a new `AuthService`.
    #[must_use]
    pub fn new(store: DataSource, session_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            store,
            session_ttl,
            bcrypt_cost,
        }
    }

    /// Creates the operator account unless one with that email exists.
    /// Returns `true` when a new account was stored.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if hashing or storage fails.
    pub async fn ensure_user(
        &self,
        email: &str,
        name: &str,
        role: &str,
        password: &str,
    ) -> Result<bool, GatewayError> {
        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Ok(false);
        }
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| GatewayError::Internal(format!("hashing task failed: {e}")))??;
        let created = self
            .store
            .insert_user_if_absent(&email, name, role, &hash)
            .await?;
        if created {
            tracing::info!(email = %email, role, "user account created");
        }
        Ok(created)
    }

    /// Verifies credentials and opens a session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for blank fields and
    /// [`GatewayError::Unauthorized`] for unknown users or wrong passwords.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<(Session, User), GatewayError> {
        let email = email.map(normalize_email).unwrap_or_default();
        let password = password.unwrap_or_default().to_string();
        if email.is_empty() || password.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Email and password are required".to_string(),
            ));
        }

        let Some(credentials) = self.store.find_user_by_email(&email).await? else {
            tracing::warn!(email = %email, "login for unknown account");
            return Err(GatewayError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        let hash = credentials.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| GatewayError::Internal(format!("verification task failed: {e}")))??;
        if !verified {
            tracing::warn!(email = %email, "login with wrong password");
            return Err(GatewayError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let now = Utc::now();
        let session = Session {
            token: new_token(),
            user_id: credentials.user.id,
            expires_at: now + self.session_ttl,
        };
        self.store.create_session(&session, now).await?;
        tracing::info!(user_id = credentials.user.id, "session opened");
        Ok((session, credentials.user))
    }

    /// Revokes a session token.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] if the token is unknown.
    pub async fn logout(&self, token: &str) -> Result<(), GatewayError> {
        if self.store.delete_session(token).await? {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized("Invalid or expired session".to_string()))
        }
    }

    /// Resolves a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for unknown or expired tokens.
    pub async fn authenticate(&self, token: &str) -> Result<User, GatewayError> {
        self.store
            .session_user(token, Utc::now())
            .await?
            .ok_or_else(|| GatewayError::Unauthorized("Invalid or expired session".to_string()))
    }
}

/// 256 random bits rendered as 64 hex characters.
fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    async fn service_with_admin() -> AuthService {
        let svc = AuthService::new(DataSource::Memory(MemoryStore::new()), Duration::hours(1), 4);
        let Ok(true) = svc
            .ensure_user("Admin@BinThere.com", "Administrator", ADMIN_ROLE, "admin123")
            .await
        else {
            panic!("admin seeded");
        };
        svc
    }

    #[test]
    fn tokens_are_long_and_unique() {
        let a = new_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, new_token());
    }

    #[tokio::test]
    async fn ensure_user_is_idempotent() {
        let svc = service_with_admin().await;
        let again = svc
            .ensure_user("admin@binthere.com", "Other", ADMIN_ROLE, "changed")
            .await;
        assert!(matches!(again, Ok(false)));
    }

    #[tokio::test]
    async fn login_and_authenticate() {
        let svc = service_with_admin().await;
        let Ok((session, user)) = svc
            .login(Some(" admin@binthere.com "), Some("admin123"))
            .await
        else {
            panic!("login");
        };
        assert_eq!(user.role, ADMIN_ROLE);
        let Ok(me) = svc.authenticate(&session.token).await else {
            panic!("authenticate");
        };
        assert_eq!(me, user);

        assert!(svc.logout(&session.token).await.is_ok());
        assert!(matches!(
            svc.authenticate(&session.token).await,
            Err(GatewayError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn wrong_or_blank_credentials_are_rejected() {
        let svc = service_with_admin().await;
        assert!(matches!(
            svc.login(Some("admin@binthere.com"), Some("nope")).await,
            Err(GatewayError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.login(Some("ghost@binthere.com"), Some("admin123")).await,
            Err(GatewayError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.login(Some(""), Some("admin123")).await,
            Err(GatewayError::InvalidRequest(_))
        ));
        assert!(matches!(
            svc.login(Some("admin@binthere.com"), None).await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }
}
