//! Live events reflecting fleet and alert changes.
//!
//! Every committed mutation emits a [`DustbinEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DustbinId;
use super::renumber::Reassignment;

/// Subscription topic an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Bin inventory and fill-level changes.
    Dustbins,
    /// Critical alert lifecycle.
    Notifications,
}

impl Topic {
    /// Parses a topic name as sent by WebSocket clients.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "dustbins" => Some(Self::Dustbins),
            "notifications" => Some(Self::Notifications),
            _ => None,
        }
    }
}

/// Domain event emitted after every committed mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DustbinEvent {
    /// A bin was added to the fleet.
    DustbinAdded {
        /// New bin identifier.
        dustbin_id: DustbinId,
        /// Location text.
        location: String,
        /// Event time.
        timestamp: DateTime<Utc>,
    },

    /// A bin's location was edited.
    DustbinUpdated {
        /// Bin identifier.
        dustbin_id: DustbinId,
        /// New location text.
        location: String,
        /// Event time.
        timestamp: DateTime<Utc>,
    },

    /// A sensor reading was ingested.
    FillLevelUpdated {
        /// Bin identifier.
        dustbin_id: DustbinId,
        /// Overall fill level.
        overall_fill_level: i32,
        /// Wet waste fill level.
        wet_waste_fill_level: i32,
        /// Dry waste fill level.
        dry_waste_fill_level: i32,
        /// Battery level after the reading.
        battery_level: i32,
        /// Event time.
        timestamp: DateTime<Utc>,
    },

    /// Bins were retired and the fleet renumbered.
    DustbinsRemoved {
        /// Identifiers retired, as they were before renumbering.
        removed: Vec<DustbinId>,
        /// Identifier changes applied to survivors.
        reassigned: Vec<Reassignment>,
        /// Event time.
        timestamp: DateTime<Utc>,
    },

    /// A bin crossed the critical threshold and a notification was raised.
    CriticalAlert {
        /// New notification identifier.
        notification_id: i64,
        /// Bin identifier.
        dustbin_id: DustbinId,
        /// Bin location at crossing time.
        location: String,
        /// Overall fill level at crossing time.
        fill_level: i32,
        /// Crossing instant.
        critical_timestamp: DateTime<Utc>,
    },

    /// A notification reached the resolved state.
    NotificationResolved {
        /// Notification identifier.
        notification_id: i64,
        /// Resolving user, if authenticated.
        resolved_by: Option<i64>,
        /// Event time.
        timestamp: DateTime<Utc>,
    },
}

impl DustbinEvent {
    /// Returns the topic this event is delivered on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::DustbinAdded { .. }
            | Self::DustbinUpdated { .. }
            | Self::FillLevelUpdated { .. }
            | Self::DustbinsRemoved { .. } => Topic::Dustbins,
            Self::CriticalAlert { .. } | Self::NotificationResolved { .. } => {
                Topic::Notifications
            }
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::DustbinAdded { .. } => "dustbin_added",
            Self::DustbinUpdated { .. } => "dustbin_updated",
            Self::FillLevelUpdated { .. } => "fill_level_updated",
            Self::DustbinsRemoved { .. } => "dustbins_removed",
            Self::CriticalAlert { .. } => "critical_alert",
            Self::NotificationResolved { .. } => "notification_resolved",
        }
    }
}
