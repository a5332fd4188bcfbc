//! Deterministic demo fleet for the in-memory data source.
//!
//! Eight bins with fixed fill and battery levels, a year of daily history
//! per bin following a seeded wave pattern, and an open notification for
//! every bin that starts at or above the critical threshold.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Dustbin, DustbinId, HistorySample, NewNotification, Notification};

/// Days of history generated per bin.
pub const HISTORY_DAYS: i64 = 365;

struct SeedBin {
    location: &'static str,
    overall: i32,
    wet: i32,
    dry: i32,
    battery: i32,
    critical_minutes_ago: Option<i64>,
}

const FLEET: [SeedBin; 8] = [
    SeedBin {
        location: "Central Park North",
        overall: 85,
        wet: 78,
        dry: 92,
        battery: 85,
        critical_minutes_ago: Some(5),
    },
    SeedBin {
        location: "Market District",
        overall: 65,
        wet: 68,
        dry: 62,
        battery: 92,
        critical_minutes_ago: None,
    },
    SeedBin {
        location: "Residential Zone A",
        overall: 45,
        wet: 42,
        dry: 48,
        battery: 78,
        critical_minutes_ago: None,
    },
    SeedBin {
        location: "Shopping Mall",
        overall: 92,
        wet: 95,
        dry: 89,
        battery: 15,
        critical_minutes_ago: Some(2),
    },
    SeedBin {
        location: "Industrial Area",
        overall: 73,
        wet: 58,
        dry: 88,
        battery: 68,
        critical_minutes_ago: None,
    },
    SeedBin {
        location: "School Campus",
        overall: 55,
        wet: 61,
        dry: 49,
        battery: 95,
        critical_minutes_ago: None,
    },
    SeedBin {
        location: "Hospital Quarter",
        overall: 38,
        wet: 35,
        dry: 41,
        battery: 38,
        critical_minutes_ago: None,
    },
    SeedBin {
        location: "Tech Park",
        overall: 81,
        wet: 76,
        dry: 86,
        battery: 55,
        critical_minutes_ago: Some(7),
    },
];

/// Generated demo records.
#[derive(Debug, Clone, Default)]
pub struct DemoFleet {
    /// Active bins `001`..`008`.
    pub dustbins: Vec<Dustbin>,
    /// Daily samples, oldest first per bin.
    pub history: Vec<HistorySample>,
    /// Open alerts for the bins that start critical.
    pub notifications: Vec<Notification>,
}

/// Builds the demo fleet relative to `now`.
#[must_use]
pub fn seed(now: DateTime<Utc>) -> DemoFleet {
    let mut fleet = DemoFleet::default();

    for (position, entry) in (1u32..).zip(FLEET.iter()) {
        let id = DustbinId::from_position(position);
        let offset = i64::from(position);

        let mut bin = Dustbin::new(id.clone(), entry.location.to_string(), now);
        bin.overall_fill_level = entry.overall;
        bin.wet_waste_fill_level = entry.wet;
        bin.dry_waste_fill_level = entry.dry;
        bin.battery_level = entry.battery;
        bin.last_updated = now - Duration::minutes(offset * 3);
        bin.last_maintenance = now - Duration::days(offset);
        bin.created_at = now - Duration::days(HISTORY_DAYS);
        bin.critical_timestamp = entry
            .critical_minutes_ago
            .map(|mins| now - Duration::minutes(mins));

        for day in (0..HISTORY_DAYS).rev() {
            let phase = (day + offset) as f64 * 0.5;
            let wet = wave(entry.wet, phase.sin());
            let dry = wave(entry.dry, phase.cos());
            fleet.history.push(HistorySample {
                dustbin_id: id.clone(),
                timestamp: now - Duration::days(day) - Duration::minutes(offset * 5),
                overall_fill_level: (wet + dry + 1) / 2,
                wet_waste_fill_level: wet,
                dry_waste_fill_level: dry,
                battery_level: Some(entry.battery),
            });
        }

        if let Some(snapshot) = NewNotification::snapshot(&bin) {
            let next_id = i64::try_from(fleet.notifications.len()).unwrap_or(0) + 1;
            fleet
                .notifications
                .push(snapshot.into_notification(next_id, now));
        }
        fleet.dustbins.push(bin);
    }

    fleet
}

fn wave(base: i32, factor: f64) -> i32 {
    let value = f64::from(base) + factor * 15.0;
    (value.round() as i32).clamp(0, 100)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::renumber::is_contiguous;

    #[test]
    fn fleet_is_contiguous_and_complete() {
        let fleet = seed(Utc::now());
        let ids: Vec<DustbinId> = fleet.dustbins.iter().map(|b| b.id.clone()).collect();
        assert_eq!(ids.len(), 8);
        assert!(is_contiguous(&ids));
        assert_eq!(fleet.history.len(), 8 * 365);
    }

    #[test]
    fn critical_bins_have_open_notifications() {
        let fleet = seed(Utc::now());
        let mut alerted: Vec<&str> = fleet
            .notifications
            .iter()
            .map(|n| n.dustbin_id.as_str())
            .collect();
        alerted.sort_unstable();
        assert_eq!(alerted, vec!["001", "004", "008"]);
        assert!(fleet.notifications.iter().all(|n| !n.is_read && !n.is_resolved));
    }

    #[test]
    fn history_stays_in_range_and_in_the_past() {
        let now = Utc::now();
        let fleet = seed(now);
        assert!(fleet.history.iter().all(|s| {
            s.timestamp < now
                && (0..=100).contains(&s.wet_waste_fill_level)
                && (0..=100).contains(&s.dry_waste_fill_level)
        }));
    }

    #[test]
    fn seeding_is_deterministic() {
        let now = Utc::now();
        let a = seed(now);
        let b = seed(now);
        assert_eq!(a.history, b.history);
        assert_eq!(a.dustbins, b.dustbins);
    }
}
