//! Operator accounts and login sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An operator account as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Row identifier.
    pub id: i64,
    /// Login email (unique, stored lower-case).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role label (`"admin"`, `"operator"`).
    pub role: String,
}

/// A user together with the stored bcrypt hash, used only for login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// Account data.
    pub user: User,
    /// bcrypt password hash.
    pub password_hash: String,
}

/// An issued login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque bearer token.
    pub token: String,
    /// Owning user.
    pub user_id: i64,
    /// Expiry instant; the session is rejected from then on.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Returns `true` while the session is usable at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Normalises an email address for lookup.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
