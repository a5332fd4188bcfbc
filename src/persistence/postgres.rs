//! PostgreSQL implementation of the persistence layer.
//!
//! Every multi-statement operation runs inside one transaction; dropping
//! the transaction on an early `?` return rolls it back.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};

use super::models::{
    DailyAverageRow, DailyTrendRow, DustbinRow, FleetSummaryRow, NotificationRow, UserRow,
};
use super::{ReadingOutcome, RemovalOutcome};
use crate::config::GatewayConfig;
use crate::domain::analytics::{DailyAverage, DailyTrend, FleetSummary};
use crate::domain::dustbin::{CRITICAL_FILL_THRESHOLD, LOW_BATTERY_THRESHOLD};
use crate::domain::dustbin_id::next_id;
use crate::domain::{
    CriticalTransition, DateRange, Dustbin, DustbinId, FillReading, NewNotification,
    Notification, Session, User, UserCredentials, plan_renumbering,
};
use crate::error::GatewayError;

macro_rules! dustbin_columns {
    () => {
        "id, name, location, overall_fill_level, wet_waste_fill_level, dry_waste_fill_level, \
         battery_level, last_updated, last_maintenance, critical_timestamp, is_active, \
         created_at, updated_at"
    };
}

macro_rules! notification_columns {
    () => {
        "id, dustbin_id, dustbin_name, dustbin_location, fill_level, critical_timestamp, \
         is_read, is_resolved, resolved_by, resolved_at, created_at"
    };
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized and timed out per `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database_idle_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Checks connectivity with a trivial query.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// Lists active bins in identifier order.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_dustbins(&self) -> Result<Vec<Dustbin>, GatewayError> {
        let rows = sqlx::query_as::<_, DustbinRow>(concat!(
            "SELECT ",
            dustbin_columns!(),
            " FROM dustbins WHERE is_active = TRUE ORDER BY LENGTH(id), id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Dustbin::from).collect())
    }

    /// Fetches one active bin.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn get_dustbin(&self, id: &DustbinId) -> Result<Option<Dustbin>, GatewayError> {
        let row = sqlx::query_as::<_, DustbinRow>(concat!(
            "SELECT ",
            dustbin_columns!(),
            " FROM dustbins WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Dustbin::from))
    }

    /// Inserts a new bin with the next sequential identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure,
    /// including a key conflict with a concurrent insert.
    pub async fn insert_dustbin(
        &self,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Dustbin, GatewayError> {
        let highest: Option<String> = sqlx::query_scalar(
            "SELECT id FROM dustbins WHERE id ~ '^[0-9]+$' \
             ORDER BY LENGTH(id) DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        let highest = highest.map(DustbinId::from);
        let bin = Dustbin::new(next_id(highest.as_ref()), location.to_string(), now);

        let row = sqlx::query_as::<_, DustbinRow>(concat!(
            "INSERT INTO dustbins (id, name, location, overall_fill_level, wet_waste_fill_level, \
             dry_waste_fill_level, battery_level, last_updated, last_maintenance, \
             critical_timestamp, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING ",
            dustbin_columns!()
        ))
        .bind(bin.id.as_str())
        .bind(&bin.name)
        .bind(&bin.location)
        .bind(bin.overall_fill_level)
        .bind(bin.wet_waste_fill_level)
        .bind(bin.dry_waste_fill_level)
        .bind(bin.battery_level)
        .bind(bin.last_updated)
        .bind(bin.last_maintenance)
        .bind(bin.critical_timestamp)
        .bind(bin.is_active)
        .bind(bin.created_at)
        .bind(bin.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Changes the location of an active bin.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn update_location(
        &self,
        id: &DustbinId,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Dustbin>, GatewayError> {
        let row = sqlx::query_as::<_, DustbinRow>(concat!(
            "UPDATE dustbins SET location = $1, updated_at = $2 \
             WHERE id = $3 AND is_active = TRUE RETURNING ",
            dustbin_columns!()
        ))
        .bind(location)
        .bind(now)
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Dustbin::from))
    }

    /// Retires the given bins and renumbers the survivors in one
    /// transaction.
    ///
    /// The whole active set is row-locked first, so concurrent removals
    /// queue behind each other instead of interleaving.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure;
    /// nothing is changed in that case.
    pub async fn remove_and_renumber(
        &self,
        ids: &[DustbinId],
        now: DateTime<Utc>,
    ) -> Result<RemovalOutcome, GatewayError> {
        let mut tx = self.pool.begin().await?;

        let active: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM dustbins WHERE is_active = TRUE ORDER BY LENGTH(id), id FOR UPDATE",
        )
        .fetch_all(&mut *tx)
        .await?;
        let (retiring, surviving): (Vec<DustbinId>, Vec<DustbinId>) = active
            .into_iter()
            .map(DustbinId::from)
            .partition(|id| ids.contains(id));

        for old in &retiring {
            let tombstone = DustbinId::tombstone();
            move_references(&mut tx, old, &tombstone).await?;
            sqlx::query(
                "UPDATE dustbins SET id = $1, is_active = FALSE, updated_at = $2 WHERE id = $3",
            )
            .bind(tombstone.as_str())
            .bind(now)
            .bind(old.as_str())
            .execute(&mut *tx)
            .await?;
        }

        let reassigned = plan_renumbering(&surviving);
        for change in &reassigned {
            move_references(&mut tx, &change.from, &change.to).await?;
            sqlx::query("UPDATE dustbins SET id = $1, name = $2, updated_at = $3 WHERE id = $4")
                .bind(change.to.as_str())
                .bind(change.to.display_name())
                .bind(now)
                .bind(change.from.as_str())
                .execute(&mut *tx)
                .await?;
        }

        let rows = sqlx::query_as::<_, DustbinRow>(concat!(
            "SELECT ",
            dustbin_columns!(),
            " FROM dustbins WHERE is_active = TRUE ORDER BY LENGTH(id), id"
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RemovalOutcome {
            removed: retiring,
            reassigned,
            dustbins: rows.into_iter().map(Dustbin::from).collect(),
        })
    }

    /// Applies a sensor reading: updates the bin, appends a history sample
    /// and raises a notification on a critical crossing, atomically.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn apply_reading(
        &self,
        id: &DustbinId,
        reading: &FillReading,
        now: DateTime<Utc>,
    ) -> Result<Option<ReadingOutcome>, GatewayError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, DustbinRow>(concat!(
            "SELECT ",
            dustbin_columns!(),
            " FROM dustbins WHERE id = $1 AND is_active = TRUE FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut bin = Dustbin::from(row);
        let transition = bin.apply_reading(reading, now);

        sqlx::query(
            "UPDATE dustbins SET overall_fill_level = $1, wet_waste_fill_level = $2, \
             dry_waste_fill_level = $3, battery_level = $4, critical_timestamp = $5, \
             last_updated = $6, updated_at = $6 WHERE id = $7",
        )
        .bind(bin.overall_fill_level)
        .bind(bin.wet_waste_fill_level)
        .bind(bin.dry_waste_fill_level)
        .bind(bin.battery_level)
        .bind(bin.critical_timestamp)
        .bind(now)
        .bind(bin.id.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO dustbin_history (dustbin_id, timestamp, overall_fill_level, \
             wet_waste_fill_level, dry_waste_fill_level, battery_level) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(bin.id.as_str())
        .bind(now)
        .bind(reading.overall)
        .bind(reading.wet)
        .bind(reading.dry)
        .bind(reading.battery)
        .execute(&mut *tx)
        .await?;

        let notification = match (transition, NewNotification::snapshot(&bin)) {
            (CriticalTransition::Entered, Some(snapshot)) => {
                Some(insert_notification(&mut tx, &snapshot, now).await?)
            }
            _ => None,
        };

        tx.commit().await?;

        Ok(Some(ReadingOutcome {
            dustbin: bin,
            transition,
            notification,
        }))
    }

    /// Lists unresolved notifications, most recent crossing first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn active_notifications(&self) -> Result<Vec<Notification>, GatewayError> {
        let rows = sqlx::query_as::<_, NotificationRow>(concat!(
            "SELECT ",
            notification_columns!(),
            " FROM notifications WHERE is_resolved = FALSE \
             ORDER BY critical_timestamp DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Marks a notification acknowledged.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn mark_notification_read(
        &self,
        id: i64,
    ) -> Result<Option<Notification>, GatewayError> {
        let row = sqlx::query_as::<_, NotificationRow>(concat!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING ",
            notification_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Notification::from))
    }

    /// Resolves a notification. Returns the row and whether this call
    /// performed the resolution (`false` if it was already resolved).
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn resolve_notification(
        &self,
        id: i64,
        resolver: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<(Notification, bool)>, GatewayError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, NotificationRow>(concat!(
            "SELECT ",
            notification_columns!(),
            " FROM notifications WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(None);
        };
        if current.is_resolved {
            return Ok(Some((current.into(), false)));
        }

        let row = sqlx::query_as::<_, NotificationRow>(concat!(
            "UPDATE notifications SET is_resolved = TRUE, resolved_by = $2, resolved_at = $3 \
             WHERE id = $1 RETURNING ",
            notification_columns!()
        ))
        .bind(id)
        .bind(resolver)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some((row.into(), true)))
    }

    /// Deletes a notification row.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_notification(&self, id: i64) -> Result<bool, GatewayError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Counts notifications that are neither read nor resolved.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn unread_notification_count(&self) -> Result<i64, GatewayError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE is_read = FALSE AND is_resolved = FALSE",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Daily wet/dry averages inside `range`, optionally for one bin.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn daily_averages(
        &self,
        range: &DateRange,
        dustbin: Option<&DustbinId>,
    ) -> Result<Vec<DailyAverage>, GatewayError> {
        let rows = sqlx::query_as::<_, DailyAverageRow>(
            "SELECT (timestamp AT TIME ZONE 'UTC')::DATE AS day, \
             ROUND(AVG(wet_waste_fill_level))::INTEGER AS wet_waste, \
             ROUND(AVG(dry_waste_fill_level))::INTEGER AS dry_waste \
             FROM dustbin_history \
             WHERE timestamp >= $1 AND timestamp < $2 \
             AND ($3::TEXT IS NULL OR dustbin_id = $3) \
             GROUP BY day ORDER BY day",
        )
        .bind(range.start)
        .bind(range.end)
        .bind(dustbin.map(DustbinId::as_str))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DailyAverage::from).collect())
    }

    /// Daily fleet rollups since `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn daily_trends(&self, since: DateTime<Utc>) -> Result<Vec<DailyTrend>, GatewayError> {
        let rows = sqlx::query_as::<_, DailyTrendRow>(
            "SELECT (timestamp AT TIME ZONE 'UTC')::DATE AS day, \
             ROUND(AVG(overall_fill_level))::INTEGER AS avg_fill, \
             ROUND(AVG(wet_waste_fill_level))::INTEGER AS avg_wet, \
             ROUND(AVG(dry_waste_fill_level))::INTEGER AS avg_dry, \
             COUNT(DISTINCT dustbin_id) AS active_dustbins \
             FROM dustbin_history WHERE timestamp >= $1 \
             GROUP BY day ORDER BY day DESC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(DailyTrend::from).collect())
    }

    /// Snapshot rollup of the active fleet.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn fleet_summary(&self, now: DateTime<Utc>) -> Result<FleetSummary, GatewayError> {
        let row = sqlx::query_as::<_, FleetSummaryRow>(
            "SELECT COUNT(*) AS total_dustbins, \
             COUNT(*) FILTER (WHERE overall_fill_level >= $1) AS critical_dustbins, \
             COUNT(*) FILTER (WHERE battery_level < $2) AS low_battery_dustbins, \
             COALESCE(ROUND(AVG(overall_fill_level)), 0)::INTEGER AS average_fill_level, \
             COALESCE(ROUND(AVG(wet_waste_fill_level)), 0)::INTEGER AS average_wet_waste, \
             COALESCE(ROUND(AVG(dry_waste_fill_level)), 0)::INTEGER AS average_dry_waste, \
             COALESCE(ROUND(AVG(battery_level)), 0)::INTEGER AS average_battery_level, \
             (SELECT COUNT(DISTINCT h.dustbin_id) FROM dustbin_history h \
              JOIN dustbins d ON d.id = h.dustbin_id AND d.is_active = TRUE \
              WHERE h.timestamp >= $3) AS reporting_last_24h, \
             (SELECT MAX(timestamp) FROM dustbin_history) AS latest_sample_at \
             FROM dustbins WHERE is_active = TRUE",
        )
        .bind(CRITICAL_FILL_THRESHOLD)
        .bind(LOW_BATTERY_THRESHOLD)
        .bind(now - chrono::Duration::hours(24))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Looks up login credentials by normalised email.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, GatewayError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, name, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserCredentials::from))
    }

    /// Creates a user unless the email is already taken. Returns `true`
    /// when a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn insert_user_if_absent(
        &self,
        email: &str,
        name: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "INSERT INTO users (email, name, role, password_hash) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores a new session and deletes every session expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn create_session(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut tx = self.pool.begin().await?;
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        if pruned > 0 {
            tracing::debug!(pruned, "expired sessions deleted");
        }
        Ok(())
    }

    /// Resolves a session token to its user if it has not expired.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, GatewayError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT u.id, u.email, u.name, u.role, u.password_hash \
             FROM sessions s JOIN users u ON u.id = s.user_id \
             WHERE s.token = $1 AND s.expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| UserCredentials::from(r).user))
    }

    /// Revokes a session. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn delete_session(&self, token: &str) -> Result<bool, GatewayError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Points history and notification rows at `to`. Runs before the parent
/// row changes; the foreign keys are deferred to commit.
async fn move_references(
    conn: &mut PgConnection,
    from: &DustbinId,
    to: &DustbinId,
) -> Result<(), GatewayError> {
    sqlx::query("UPDATE dustbin_history SET dustbin_id = $1 WHERE dustbin_id = $2")
        .bind(to.as_str())
        .bind(from.as_str())
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE notifications SET dustbin_id = $1 WHERE dustbin_id = $2")
        .bind(to.as_str())
        .bind(from.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

async fn insert_notification(
    conn: &mut PgConnection,
    snapshot: &NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification, GatewayError> {
    let row = sqlx::query_as::<_, NotificationRow>(concat!(
        "INSERT INTO notifications (dustbin_id, dustbin_name, dustbin_location, fill_level, \
         critical_timestamp, created_at) VALUES ($1, $2, $3, $4, $5, $6) RETURNING ",
        notification_columns!()
    ))
    .bind(snapshot.dustbin_id.as_str())
    .bind(&snapshot.dustbin_name)
    .bind(&snapshot.dustbin_location)
    .bind(snapshot.fill_level)
    .bind(snapshot.critical_timestamp)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row.into())
}
