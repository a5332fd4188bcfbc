//! Database row types and their conversion into domain records.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::domain::analytics::{DailyAverage, DailyTrend, FleetSummary};
use crate::domain::{Dustbin, DustbinId, Notification, User, UserCredentials};

/// A row of the `dustbins` table.
#[derive(Debug, Clone, FromRow)]
pub struct DustbinRow {
    /// Sequential or tombstone identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Location text.
    pub location: String,
    /// Overall fill level.
    pub overall_fill_level: i32,
    /// Wet waste fill level.
    pub wet_waste_fill_level: i32,
    /// Dry waste fill level.
    pub dry_waste_fill_level: i32,
    /// Battery level.
    pub battery_level: i32,
    /// Last reading time.
    pub last_updated: DateTime<Utc>,
    /// Last maintenance time.
    pub last_maintenance: DateTime<Utc>,
    /// Critical crossing instant.
    pub critical_timestamp: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<DustbinRow> for Dustbin {
    fn from(row: DustbinRow) -> Self {
        Self {
            id: DustbinId::from(row.id),
            name: row.name,
            location: row.location,
            overall_fill_level: row.overall_fill_level,
            wet_waste_fill_level: row.wet_waste_fill_level,
            dry_waste_fill_level: row.dry_waste_fill_level,
            battery_level: row.battery_level,
            last_updated: row.last_updated,
            last_maintenance: row.last_maintenance,
            critical_timestamp: row.critical_timestamp,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of the `notifications` table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    /// Row identifier.
    pub id: i64,
    /// Referenced bin.
    pub dustbin_id: String,
    /// Snapshot name.
    pub dustbin_name: String,
    /// Snapshot location.
    pub dustbin_location: String,
    /// Snapshot fill level.
    pub fill_level: i32,
    /// Crossing instant.
    pub critical_timestamp: DateTime<Utc>,
    /// Acknowledged flag.
    pub is_read: bool,
    /// Resolution flag.
    pub is_resolved: bool,
    /// Resolving user.
    pub resolved_by: Option<i64>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: row.id,
            dustbin_id: DustbinId::from(row.dustbin_id),
            dustbin_name: row.dustbin_name,
            dustbin_location: row.dustbin_location,
            fill_level: row.fill_level,
            critical_timestamp: row.critical_timestamp,
            is_read: row.is_read,
            is_resolved: row.is_resolved,
            resolved_by: row.resolved_by,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Row identifier.
    pub id: i64,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role label.
    pub role: String,
    /// bcrypt hash.
    pub password_hash: String,
}

impl From<UserRow> for UserCredentials {
    fn from(row: UserRow) -> Self {
        Self {
            user: User {
                id: row.id,
                email: row.email,
                name: row.name,
                role: row.role,
            },
            password_hash: row.password_hash,
        }
    }
}

/// One day of the analytics series as aggregated in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct DailyAverageRow {
    /// Bucket day.
    pub day: NaiveDate,
    /// Rounded mean wet level.
    pub wet_waste: i32,
    /// Rounded mean dry level.
    pub dry_waste: i32,
}

impl From<DailyAverageRow> for DailyAverage {
    fn from(row: DailyAverageRow) -> Self {
        Self {
            day: row.day,
            wet_waste: row.wet_waste,
            dry_waste: row.dry_waste,
        }
    }
}

/// One day of the trends rollup as aggregated in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct DailyTrendRow {
    /// Bucket day.
    pub day: NaiveDate,
    /// Rounded mean overall level.
    pub avg_fill: i32,
    /// Rounded mean wet level.
    pub avg_wet: i32,
    /// Rounded mean dry level.
    pub avg_dry: i32,
    /// Distinct reporting bins.
    pub active_dustbins: i64,
}

impl From<DailyTrendRow> for DailyTrend {
    fn from(row: DailyTrendRow) -> Self {
        Self {
            day: row.day,
            avg_fill: row.avg_fill,
            avg_wet: row.avg_wet,
            avg_dry: row.avg_dry,
            active_dustbins: row.active_dustbins,
        }
    }
}

/// Fleet summary as aggregated in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct FleetSummaryRow {
    /// Active bins.
    pub total_dustbins: i64,
    /// Critical bins.
    pub critical_dustbins: i64,
    /// Low-battery bins.
    pub low_battery_dustbins: i64,
    /// Mean overall fill.
    pub average_fill_level: i32,
    /// Mean wet fill.
    pub average_wet_waste: i32,
    /// Mean dry fill.
    pub average_dry_waste: i32,
    /// Mean battery.
    pub average_battery_level: i32,
    /// Distinct active bins reporting in the last 24 hours.
    pub reporting_last_24h: i64,
    /// Latest history sample.
    pub latest_sample_at: Option<DateTime<Utc>>,
}

impl From<FleetSummaryRow> for FleetSummary {
    fn from(row: FleetSummaryRow) -> Self {
        Self {
            total_dustbins: row.total_dustbins,
            critical_dustbins: row.critical_dustbins,
            low_battery_dustbins: row.low_battery_dustbins,
            average_fill_level: row.average_fill_level,
            average_wet_waste: row.average_wet_waste,
            average_dry_waste: row.average_dry_waste,
            average_battery_level: row.average_battery_level,
            reporting_last_24h: row.reporting_last_24h,
            latest_sample_at: row.latest_sample_at,
        }
    }
}
