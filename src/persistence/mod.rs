//! Persistence layer: PostgreSQL store and the in-memory demo store.
//!
//! [`DataSource`] is selected once at startup from configuration and
//! dispatches every operation to the chosen backend. Both backends keep
//! the same semantics, so services and handlers never know which one is
//! in use.

pub mod demo;
pub mod memory;
pub mod models;
pub mod postgres;

use chrono::{DateTime, Utc};

use crate::config::{DataSourceKind, GatewayConfig};
use crate::domain::analytics::{DailyAverage, DailyTrend, FleetSummary};
use crate::domain::{
    CriticalTransition, DateRange, Dustbin, DustbinId, FillReading, Notification, Reassignment,
    Session, User, UserCredentials,
};
use crate::error::GatewayError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Result of a bulk removal followed by renumbering.
#[derive(Debug, Clone)]
pub struct RemovalOutcome {
    /// Identifiers (pre-renumbering) that were actually retired.
    pub removed: Vec<DustbinId>,
    /// Identifier changes applied to surviving bins.
    pub reassigned: Vec<Reassignment>,
    /// Active fleet after renumbering, in identifier order.
    pub dustbins: Vec<Dustbin>,
}

/// Result of applying one sensor reading.
#[derive(Debug, Clone)]
pub struct ReadingOutcome {
    /// Bin after the update.
    pub dustbin: Dustbin,
    /// Critical transition caused by the reading.
    pub transition: CriticalTransition,
    /// Notification raised on entry into the critical range.
    pub notification: Option<Notification>,
}

/// The configured storage backend.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// PostgreSQL via `sqlx`.
    Postgres(PostgresStore),
    /// Process-local store seeded with the demo fleet.
    Memory(MemoryStore),
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Self::Postgres($store) => $call.await,
            Self::Memory($store) => $call.await,
        }
    };
}

impl DataSource {
    /// Opens the backend named by `config.data_source`, applying
    /// migrations for PostgreSQL when enabled.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database cannot
    /// be reached or migrated.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        match config.data_source {
            DataSourceKind::Postgres => {
                let store = PostgresStore::connect(config).await?;
                if config.run_migrations {
                    store.migrate().await?;
                    tracing::info!("database migrations applied");
                }
                Ok(Self::Postgres(store))
            }
            DataSourceKind::Demo => Ok(Self::Memory(MemoryStore::seeded(Utc::now()))),
        }
    }

    /// Short backend name for health output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "demo",
        }
    }

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] when it is not.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        dispatch!(self, s => s.ping())
    }

    /// Lists active bins in identifier order.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn list_dustbins(&self) -> Result<Vec<Dustbin>, GatewayError> {
        dispatch!(self, s => s.list_dustbins())
    }

    /// Fetches one active bin.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn get_dustbin(&self, id: &DustbinId) -> Result<Option<Dustbin>, GatewayError> {
        dispatch!(self, s => s.get_dustbin(id))
    }

    /// Inserts a bin with the next sequential identifier.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn insert_dustbin(
        &self,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Dustbin, GatewayError> {
        dispatch!(self, s => s.insert_dustbin(location, now))
    }

    /// Changes the location of an active bin.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn update_location(
        &self,
        id: &DustbinId,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Dustbin>, GatewayError> {
        dispatch!(self, s => s.update_location(id, location, now))
    }

    /// Retires bins and renumbers the survivors atomically.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; nothing changes on error.
    pub async fn remove_and_renumber(
        &self,
        ids: &[DustbinId],
        now: DateTime<Utc>,
    ) -> Result<RemovalOutcome, GatewayError> {
        dispatch!(self, s => s.remove_and_renumber(ids, now))
    }

    /// Applies a sensor reading atomically. `None` if the bin is unknown.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn apply_reading(
        &self,
        id: &DustbinId,
        reading: &FillReading,
        now: DateTime<Utc>,
    ) -> Result<Option<ReadingOutcome>, GatewayError> {
        dispatch!(self, s => s.apply_reading(id, reading, now))
    }

    /// Lists unresolved notifications, most recent crossing first.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn active_notifications(&self) -> Result<Vec<Notification>, GatewayError> {
        dispatch!(self, s => s.active_notifications())
    }

    /// Marks a notification read.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn mark_notification_read(
        &self,
        id: i64,
    ) -> Result<Option<Notification>, GatewayError> {
        dispatch!(self, s => s.mark_notification_read(id))
    }

    /// Resolves a notification; the flag tells whether this call resolved it.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn resolve_notification(
        &self,
        id: i64,
        resolver: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<(Notification, bool)>, GatewayError> {
        dispatch!(self, s => s.resolve_notification(id, resolver, now))
    }

    /// Deletes a notification. `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn delete_notification(&self, id: i64) -> Result<bool, GatewayError> {
        dispatch!(self, s => s.delete_notification(id))
    }

    /// Counts unread, unresolved notifications.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn unread_notification_count(&self) -> Result<i64, GatewayError> {
        dispatch!(self, s => s.unread_notification_count())
    }

    /// Daily wet/dry averages inside `range`, ascending.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn daily_averages(
        &self,
        range: &DateRange,
        dustbin: Option<&DustbinId>,
    ) -> Result<Vec<DailyAverage>, GatewayError> {
        dispatch!(self, s => s.daily_averages(range, dustbin))
    }

    /// Daily fleet rollups since `since`, newest first.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn daily_trends(&self, since: DateTime<Utc>) -> Result<Vec<DailyTrend>, GatewayError> {
        dispatch!(self, s => s.daily_trends(since))
    }

    /// Snapshot rollup of the active fleet.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn fleet_summary(&self, now: DateTime<Utc>) -> Result<FleetSummary, GatewayError> {
        dispatch!(self, s => s.fleet_summary(now))
    }

    /// Looks up login credentials by normalised email.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, GatewayError> {
        dispatch!(self, s => s.find_user_by_email(email))
    }

    /// Creates a user unless the email is taken.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn insert_user_if_absent(
        &self,
        email: &str,
        name: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<bool, GatewayError> {
        dispatch!(self, s => s.insert_user_if_absent(email, name, role, password_hash))
    }

    /// Stores a session and drops every session expired at `now`.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn create_session(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        dispatch!(self, s => s.create_session(session, now))
    }

    /// Resolves an unexpired session token to its user.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, GatewayError> {
        dispatch!(self, s => s.session_user(token, now))
    }

    /// Revokes a session.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn delete_session(&self, token: &str) -> Result<bool, GatewayError> {
        dispatch!(self, s => s.delete_session(token))
    }
}
