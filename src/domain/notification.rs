//! Critical-fill notifications.
//!
//! A notification is created when a bin crosses into the critical range and
//! carries a snapshot of the bin's name, location and fill level taken at
//! that moment. The snapshot is not refreshed by later edits or renumbering;
//! only `dustbin_id` follows the bin.

use chrono::{DateTime, Utc};

use super::{Dustbin, DustbinId};

/// Lifecycle state of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    /// Active and not yet acknowledged.
    Unread,
    /// Acknowledged but still unresolved.
    Read,
    /// Terminal: handled by an operator.
    Resolved,
}

/// A stored notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Row identifier.
    pub id: i64,
    /// Bin the alert refers to (follows renumbering).
    pub dustbin_id: DustbinId,
    /// Bin name at crossing time.
    pub dustbin_name: String,
    /// Bin location at crossing time.
    pub dustbin_location: String,
    /// Overall fill level at crossing time.
    pub fill_level: i32,
    /// Crossing instant.
    pub critical_timestamp: DateTime<Utc>,
    /// Acknowledged flag.
    pub is_read: bool,
    /// Resolution flag.
    pub is_resolved: bool,
    /// User that resolved the alert.
    pub resolved_by: Option<i64>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> NotificationState {
        if self.is_resolved {
            NotificationState::Resolved
        } else if self.is_read {
            NotificationState::Read
        } else {
            NotificationState::Unread
        }
    }

    /// Marks the notification acknowledged.
    pub fn mark_read(&mut self) {
        self.is_read = true;
    }

    /// Resolves the notification. Resolving twice keeps the first
    /// resolver and timestamp.
    pub fn resolve(&mut self, resolver: Option<i64>, now: DateTime<Utc>) {
        if self.is_resolved {
            return;
        }
        self.is_resolved = true;
        self.resolved_by = resolver;
        self.resolved_at = Some(now);
    }
}

/// Snapshot used to insert a new notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Bin that crossed the threshold.
    pub dustbin_id: DustbinId,
    /// Bin name at crossing time.
    pub dustbin_name: String,
    /// Bin location at crossing time.
    pub dustbin_location: String,
    /// Overall fill level at crossing time.
    pub fill_level: i32,
    /// Crossing instant.
    pub critical_timestamp: DateTime<Utc>,
}

impl NewNotification {
    /// Takes the snapshot of a bin that has just become critical.
    ///
    /// Returns `None` if the bin carries no critical timestamp.
    #[must_use]
    pub fn snapshot(bin: &Dustbin) -> Option<Self> {
        Some(Self {
            dustbin_id: bin.id.clone(),
            dustbin_name: bin.name.clone(),
            dustbin_location: bin.location.clone(),
            fill_level: bin.overall_fill_level,
            critical_timestamp: bin.critical_timestamp?,
        })
    }

    /// Materialises the row with the given identifier.
    #[must_use]
    pub fn into_notification(self, id: i64, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            dustbin_id: self.dustbin_id,
            dustbin_name: self.dustbin_name,
            dustbin_location: self.dustbin_location,
            fill_level: self.fill_level,
            critical_timestamp: self.critical_timestamp,
            is_read: false,
            is_resolved: false,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
        }
    }
}

/// Sorts notifications by crossing instant, most recent first.
pub fn sort_most_recent_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| {
        b.critical_timestamp
            .cmp(&a.critical_timestamp)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn critical_bin(now: DateTime<Utc>) -> Dustbin {
        let mut bin = Dustbin::new(DustbinId::from_position(4), "Shopping Mall".into(), now);
        bin.overall_fill_level = 92;
        bin.critical_timestamp = Some(now);
        bin
    }

    #[test]
    fn snapshot_requires_critical_timestamp() {
        let now = Utc::now();
        let mut bin = critical_bin(now);
        let Some(snap) = NewNotification::snapshot(&bin) else {
            panic!("critical bin snapshots");
        };
        assert_eq!(snap.dustbin_name, "Dustbin #004");
        assert_eq!(snap.fill_level, 92);

        bin.critical_timestamp = None;
        assert!(NewNotification::snapshot(&bin).is_none());
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let now = Utc::now();
        let Some(snap) = NewNotification::snapshot(&critical_bin(now)) else {
            panic!("snapshot");
        };
        let mut n = snap.into_notification(1, now);
        assert_eq!(n.state(), NotificationState::Unread);
        n.mark_read();
        assert_eq!(n.state(), NotificationState::Read);
        n.resolve(Some(7), now);
        assert_eq!(n.state(), NotificationState::Resolved);

        n.resolve(Some(9), now + Duration::minutes(1));
        assert_eq!(n.resolved_by, Some(7));
        assert_eq!(n.resolved_at, Some(now));
    }

    #[test]
    fn sorts_by_crossing_time_descending() {
        let now = Utc::now();
        let mut list: Vec<Notification> = [15, 2, 7]
            .into_iter()
            .zip(1..)
            .filter_map(|(mins, id)| {
                let mut bin = critical_bin(now - Duration::minutes(mins));
                bin.id = DustbinId::from_position(u32::try_from(id).unwrap_or(0));
                NewNotification::snapshot(&bin).map(|s| s.into_notification(id, now))
            })
            .collect();
        sort_most_recent_first(&mut list);
        let ids: Vec<i64> = list.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
