//! Dustbin record, sensor readings, and the critical-fill state machine.

use chrono::{DateTime, Utc};

use super::DustbinId;
use crate::error::GatewayError;

/// Overall fill percentage at or above which a bin is critical.
pub const CRITICAL_FILL_THRESHOLD: i32 = 80;

/// Battery percentage below which a bin counts as low on battery.
pub const LOW_BATTERY_THRESHOLD: i32 = 20;

/// Battery level of a freshly added bin.
pub const DEFAULT_BATTERY_LEVEL: i32 = 100;

/// A monitored waste container as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dustbin {
    /// Sequential identifier (tombstone once retired).
    pub id: DustbinId,
    /// Display name, always `"Dustbin #" + id` for active bins.
    pub name: String,
    /// Free-text location.
    pub location: String,
    /// Overall fill level, 0–100.
    pub overall_fill_level: i32,
    /// Wet waste compartment fill level, 0–100.
    pub wet_waste_fill_level: i32,
    /// Dry waste compartment fill level, 0–100.
    pub dry_waste_fill_level: i32,
    /// Sensor battery level, 0–100.
    pub battery_level: i32,
    /// Last sensor reading time.
    pub last_updated: DateTime<Utc>,
    /// Last maintenance visit.
    pub last_maintenance: DateTime<Utc>,
    /// Moment the bin last crossed the critical threshold, while it stays
    /// at or above it.
    pub critical_timestamp: Option<DateTime<Utc>>,
    /// `false` once the bin has been removed.
    pub is_active: bool,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Dustbin {
    /// Builds a new, empty bin at `location`.
    #[must_use]
    pub fn new(id: DustbinId, location: String, now: DateTime<Utc>) -> Self {
        Self {
            name: id.display_name(),
            id,
            location,
            overall_fill_level: 0,
            wet_waste_fill_level: 0,
            dry_waste_fill_level: 0,
            battery_level: DEFAULT_BATTERY_LEVEL,
            last_updated: now,
            last_maintenance: now,
            critical_timestamp: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` if the overall fill level is at or above the threshold.
    #[must_use]
    pub const fn is_critical(&self) -> bool {
        self.overall_fill_level >= CRITICAL_FILL_THRESHOLD
    }

    /// Applies a sensor reading and returns the resulting critical transition.
    ///
    /// The critical timestamp is stamped only on entry and cleared when the
    /// bin drops back below the threshold.
    pub fn apply_reading(&mut self, reading: &FillReading, now: DateTime<Utc>) -> CriticalTransition {
        let transition =
            CriticalTransition::evaluate(self.critical_timestamp.is_some(), reading.overall);
        self.overall_fill_level = reading.overall;
        self.wet_waste_fill_level = reading.wet;
        self.dry_waste_fill_level = reading.dry;
        if let Some(battery) = reading.battery {
            self.battery_level = battery;
        }
        self.critical_timestamp = transition.next_timestamp(self.critical_timestamp, now);
        self.last_updated = now;
        self.updated_at = now;
        transition
    }
}

/// Validated sensor reading for the fill-level ingestion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReading {
    /// Overall fill level, 0–100.
    pub overall: i32,
    /// Wet waste fill level, 0–100.
    pub wet: i32,
    /// Dry waste fill level, 0–100.
    pub dry: i32,
    /// Battery level, 0–100; `None` keeps the stored value.
    pub battery: Option<i32>,
}

impl FillReading {
    /// Validates raw optional fields from a request body.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if any fill level is missing
    /// or any value lies outside 0–100.
    pub fn new(
        overall: Option<i32>,
        wet: Option<i32>,
        dry: Option<i32>,
        battery: Option<i32>,
    ) -> Result<Self, GatewayError> {
        let (Some(overall), Some(wet), Some(dry)) = (overall, wet, dry) else {
            return Err(GatewayError::InvalidRequest(
                "Fill levels are required".to_string(),
            ));
        };
        check_percentage("overallFillLevel", overall)?;
        check_percentage("wetWasteFillLevel", wet)?;
        check_percentage("dryWasteFillLevel", dry)?;
        if let Some(b) = battery {
            check_percentage("batteryLevel", b)?;
        }
        Ok(Self {
            overall,
            wet,
            dry,
            battery,
        })
    }
}

fn check_percentage(field: &str, value: i32) -> Result<(), GatewayError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "{field} must be between 0 and 100, got {value}"
        )))
    }
}

/// Outcome of a reading with respect to the critical threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriticalTransition {
    /// Crossed from below to at/above the threshold: raise a notification.
    Entered,
    /// Was critical and still is; nothing new to report.
    Sustained,
    /// Was critical and dropped below the threshold.
    Cleared,
    /// Below the threshold before and after.
    Normal,
}

impl CriticalTransition {
    /// Classifies a reading given whether the bin was already critical.
    #[must_use]
    pub const fn evaluate(was_critical: bool, overall: i32) -> Self {
        match (was_critical, overall >= CRITICAL_FILL_THRESHOLD) {
            (false, true) => Self::Entered,
            (true, true) => Self::Sustained,
            (true, false) => Self::Cleared,
            (false, false) => Self::Normal,
        }
    }

    /// Critical timestamp after this transition.
    #[must_use]
    pub fn next_timestamp(
        self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            Self::Entered => Some(now),
            Self::Sustained => previous,
            Self::Cleared | Self::Normal => None,
        }
    }
}

/// One appended row of `dustbin_history`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySample {
    /// Bin the sample belongs to.
    pub dustbin_id: DustbinId,
    /// Sample time.
    pub timestamp: DateTime<Utc>,
    /// Overall fill level.
    pub overall_fill_level: i32,
    /// Wet waste fill level.
    pub wet_waste_fill_level: i32,
    /// Dry waste fill level.
    pub dry_waste_fill_level: i32,
    /// Battery level at sample time.
    pub battery_level: Option<i32>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bin() -> Dustbin {
        Dustbin::new(DustbinId::from_position(1), "Depot".to_string(), Utc::now())
    }

    fn reading(overall: i32) -> FillReading {
        let Ok(r) = FillReading::new(Some(overall), Some(overall), Some(overall), None) else {
            panic!("valid reading");
        };
        r
    }

    #[test]
    fn new_bin_is_empty_with_full_battery() {
        let b = bin();
        assert_eq!(b.name, "Dustbin #001");
        assert_eq!(b.overall_fill_level, 0);
        assert_eq!(b.battery_level, DEFAULT_BATTERY_LEVEL);
        assert!(b.critical_timestamp.is_none());
        assert!(b.is_active);
    }

    #[test]
    fn reading_requires_all_fill_levels() {
        assert!(FillReading::new(Some(10), None, Some(10), None).is_err());
        assert!(FillReading::new(None, None, None, Some(50)).is_err());
    }

    #[test]
    fn reading_rejects_out_of_range_values() {
        assert!(FillReading::new(Some(101), Some(0), Some(0), None).is_err());
        assert!(FillReading::new(Some(50), Some(-1), Some(0), None).is_err());
        assert!(FillReading::new(Some(50), Some(0), Some(0), Some(120)).is_err());
        assert!(FillReading::new(Some(100), Some(0), Some(0), Some(0)).is_ok());
    }

    #[test]
    fn crossing_stamps_once_and_clears_below_threshold() {
        let mut b = bin();
        let t0 = Utc::now();
        assert_eq!(b.apply_reading(&reading(85), t0), CriticalTransition::Entered);
        assert_eq!(b.critical_timestamp, Some(t0));

        let t1 = t0 + Duration::minutes(5);
        assert_eq!(b.apply_reading(&reading(95), t1), CriticalTransition::Sustained);
        assert_eq!(b.critical_timestamp, Some(t0));

        let t2 = t1 + Duration::minutes(5);
        assert_eq!(b.apply_reading(&reading(40), t2), CriticalTransition::Cleared);
        assert!(b.critical_timestamp.is_none());

        let t3 = t2 + Duration::minutes(5);
        assert_eq!(b.apply_reading(&reading(80), t3), CriticalTransition::Entered);
        assert_eq!(b.critical_timestamp, Some(t3));
        assert_eq!(b.last_updated, t3);
    }

    #[test]
    fn battery_is_kept_when_absent() {
        let mut b = bin();
        b.battery_level = 42;
        b.apply_reading(&reading(10), Utc::now());
        assert_eq!(b.battery_level, 42);

        let Ok(with_battery) = FillReading::new(Some(10), Some(10), Some(10), Some(7)) else {
            panic!("valid reading");
        };
        b.apply_reading(&with_battery, Utc::now());
        assert_eq!(b.battery_level, 7);
    }
}
