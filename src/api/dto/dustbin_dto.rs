//! Dustbin DTOs for listing, editing, removal and sensor ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::relative_time::relative_label;
use crate::domain::{Dustbin, Reassignment};

/// Request body for `POST /dustbins` and `PUT /dustbins/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DustbinLocationRequest {
    /// Free-text location; required and non-blank.
    #[serde(default)]
    pub location: Option<String>,
}

/// Request body for `DELETE /dustbins`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDustbinsRequest {
    /// Identifiers to retire; required and non-empty.
    #[serde(default)]
    pub dustbin_ids: Option<Vec<String>>,
}

/// Request body for `PUT /dustbins/{id}/fill-level`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FillLevelRequest {
    /// Overall fill level, 0–100.
    #[serde(default)]
    pub overall_fill_level: Option<i32>,
    /// Wet waste fill level, 0–100.
    #[serde(default)]
    pub wet_waste_fill_level: Option<i32>,
    /// Dry waste fill level, 0–100.
    #[serde(default)]
    pub dry_waste_fill_level: Option<i32>,
    /// Battery level, 0–100; kept unchanged when omitted.
    #[serde(default)]
    pub battery_level: Option<i32>,
}

/// A bin as presented to the dashboard.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DustbinDto {
    /// Sequential identifier (`"001"`).
    pub id: String,
    /// Display name (`"Dustbin #001"`).
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
    /// Relative age of the last reading (`"5 mins ago"`).
    pub last_updated: String,
    /// Relative age of the last maintenance visit.
    pub last_maintenance: String,
    /// Critical crossing instant in epoch milliseconds.
    pub critical_timestamp: Option<i64>,
    /// Absolute time of the last reading.
    pub last_updated_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl DustbinDto {
    /// Renders a bin with relative-time labels computed against `now`.
    #[must_use]
    pub fn from_dustbin(bin: &Dustbin, now: DateTime<Utc>) -> Self {
        Self {
            id: bin.id.to_string(),
            name: bin.name.clone(),
            location: bin.location.clone(),
            overall_fill_level: bin.overall_fill_level,
            wet_waste_fill_level: bin.wet_waste_fill_level,
            dry_waste_fill_level: bin.dry_waste_fill_level,
            battery_level: bin.battery_level,
            last_updated: relative_label(bin.last_updated, now),
            last_maintenance: relative_label(bin.last_maintenance, now),
            critical_timestamp: bin.critical_timestamp.map(|t| t.timestamp_millis()),
            last_updated_at: bin.last_updated,
            created_at: bin.created_at,
            updated_at: bin.updated_at,
        }
    }

    /// Renders a list of bins against one reference instant.
    #[must_use]
    pub fn from_list(bins: &[Dustbin], now: DateTime<Utc>) -> Vec<Self> {
        bins.iter().map(|b| Self::from_dustbin(b, now)).collect()
    }
}

/// One identifier change produced by renumbering.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReassignmentDto {
    /// Identifier before renumbering.
    pub from: String,
    /// Identifier after renumbering.
    pub to: String,
}

impl From<&Reassignment> for ReassignmentDto {
    fn from(r: &Reassignment) -> Self {
        Self {
            from: r.from.to_string(),
            to: r.to.to_string(),
        }
    }
}

/// Response body for `GET /dustbins`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DustbinListResponse {
    /// Always `true`.
    pub success: bool,
    /// Active bins in identifier order.
    pub dustbins: Vec<DustbinDto>,
}

/// Response body for single-bin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DustbinResponse {
    /// Always `true`.
    pub success: bool,
    /// The bin.
    pub dustbin: DustbinDto,
    /// Confirmation text for mutations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response body for `DELETE /dustbins`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveDustbinsResponse {
    /// Always `true`.
    pub success: bool,
    /// Identifiers actually retired (as they were before renumbering).
    pub removed: Vec<String>,
    /// Active fleet after renumbering.
    pub renumbered_dustbins: Vec<DustbinDto>,
    /// Identifier changes applied to surviving bins.
    pub reassigned: Vec<ReassignmentDto>,
    /// Confirmation text.
    pub message: String,
}
