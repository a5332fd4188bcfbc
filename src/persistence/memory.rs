//! In-memory store used by the demo data source and the test suite.
//!
//! All state sits behind one `tokio::sync::RwLock`; every mutating
//! operation takes the write lock for its whole duration, which makes each
//! one atomic in the same way a database transaction is.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::demo;
use super::{ReadingOutcome, RemovalOutcome};
use crate::domain::analytics::{self, DailyAverage, DailyTrend, FleetSummary};
use crate::domain::dustbin_id::next_id;
use crate::domain::notification::sort_most_recent_first;
use crate::domain::{
    CriticalTransition, DateRange, Dustbin, DustbinId, FillReading, HistorySample,
    NewNotification, Notification, Session, User, UserCredentials, plan_renumbering,
};
use crate::error::GatewayError;

#[derive(Debug, Default)]
struct MemoryState {
    /// Active and retired bins.
    dustbins: Vec<Dustbin>,
    history: Vec<HistorySample>,
    notifications: Vec<Notification>,
    users: Vec<UserCredentials>,
    sessions: HashMap<String, Session>,
    last_notification_id: i64,
    last_user_id: i64,
}

impl MemoryState {
    fn active(&self) -> Vec<Dustbin> {
        let mut bins: Vec<Dustbin> = self
            .dustbins
            .iter()
            .filter(|b| b.is_active)
            .cloned()
            .collect();
        bins.sort_by(|a, b| {
            a.id.as_str()
                .len()
                .cmp(&b.id.as_str().len())
                .then_with(|| a.id.cmp(&b.id))
        });
        bins
    }

    fn active_mut(&mut self, id: &DustbinId) -> Option<&mut Dustbin> {
        self.dustbins
            .iter_mut()
            .find(|b| b.is_active && &b.id == id)
    }

    fn move_references(&mut self, from: &DustbinId, to: &DustbinId) {
        for sample in self.history.iter_mut().filter(|s| &s.dustbin_id == from) {
            sample.dustbin_id = to.clone();
        }
        for note in self
            .notifications
            .iter_mut()
            .filter(|n| &n.dustbin_id == from)
        {
            note.dustbin_id = to.clone();
        }
    }
}

/// Process-local store. Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the demo fleet generated relative to `now`.
    #[must_use]
    pub fn seeded(now: DateTime<Utc>) -> Self {
        let fleet = demo::seed(now);
        let last_notification_id = fleet.notifications.iter().map(|n| n.id).max().unwrap_or(0);
        let state = MemoryState {
            dustbins: fleet.dustbins,
            history: fleet.history,
            notifications: fleet.notifications,
            last_notification_id,
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Always reachable.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Lists active bins in identifier order.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn list_dustbins(&self) -> Result<Vec<Dustbin>, GatewayError> {
        Ok(self.state.read().await.active())
    }

    /// Fetches one active bin.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn get_dustbin(&self, id: &DustbinId) -> Result<Option<Dustbin>, GatewayError> {
        let state = self.state.read().await;
        Ok(state
            .dustbins
            .iter()
            .find(|b| b.is_active && &b.id == id)
            .cloned())
    }

    /// Inserts a bin with the next sequential identifier.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn insert_dustbin(
        &self,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Dustbin, GatewayError> {
        let mut state = self.state.write().await;
        let id = next_id(state.dustbins.iter().map(|b| &b.id));
        let bin = Dustbin::new(id, location.to_string(), now);
        state.dustbins.push(bin.clone());
        Ok(bin)
    }

    /// Changes the location of an active bin.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn update_location(
        &self,
        id: &DustbinId,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Dustbin>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state.active_mut(id).map(|bin| {
            bin.location = location.to_string();
            bin.updated_at = now;
            bin.clone()
        }))
    }

    /// Retires bins and renumbers the survivors under one write lock.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn remove_and_renumber(
        &self,
        ids: &[DustbinId],
        now: DateTime<Utc>,
    ) -> Result<RemovalOutcome, GatewayError> {
        let mut state = self.state.write().await;

        let (retiring, surviving): (Vec<DustbinId>, Vec<DustbinId>) = state
            .active()
            .into_iter()
            .map(|b| b.id)
            .partition(|id| ids.contains(id));

        for old in &retiring {
            let tombstone = DustbinId::tombstone();
            state.move_references(old, &tombstone);
            if let Some(bin) = state.active_mut(old) {
                bin.id = tombstone;
                bin.is_active = false;
                bin.updated_at = now;
            }
        }

        let reassigned = plan_renumbering(&surviving);
        for change in &reassigned {
            state.move_references(&change.from, &change.to);
            if let Some(bin) = state.active_mut(&change.from) {
                bin.id = change.to.clone();
                bin.name = change.to.display_name();
                bin.updated_at = now;
            }
        }

        Ok(RemovalOutcome {
            removed: retiring,
            reassigned,
            dustbins: state.active(),
        })
    }

    /// Applies a sensor reading under one write lock.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn apply_reading(
        &self,
        id: &DustbinId,
        reading: &FillReading,
        now: DateTime<Utc>,
    ) -> Result<Option<ReadingOutcome>, GatewayError> {
        let mut state = self.state.write().await;

        let Some(bin) = state.active_mut(id) else {
            return Ok(None);
        };
        let transition = bin.apply_reading(reading, now);
        let bin = bin.clone();

        state.history.push(HistorySample {
            dustbin_id: bin.id.clone(),
            timestamp: now,
            overall_fill_level: reading.overall,
            wet_waste_fill_level: reading.wet,
            dry_waste_fill_level: reading.dry,
            battery_level: reading.battery,
        });

        let notification = match (transition, NewNotification::snapshot(&bin)) {
            (CriticalTransition::Entered, Some(snapshot)) => {
                state.last_notification_id += 1;
                let note = snapshot.into_notification(state.last_notification_id, now);
                state.notifications.push(note.clone());
                Some(note)
            }
            _ => None,
        };

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
    /// Never fails.
    pub async fn active_notifications(&self) -> Result<Vec<Notification>, GatewayError> {
        let state = self.state.read().await;
        let mut list: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| !n.is_resolved)
            .cloned()
            .collect();
        sort_most_recent_first(&mut list);
        Ok(list)
    }

    /// Marks a notification read.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn mark_notification_read(
        &self,
        id: i64,
    ) -> Result<Option<Notification>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| {
                n.mark_read();
                n.clone()
            }))
    }

    /// Resolves a notification; the flag tells whether this call resolved it.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn resolve_notification(
        &self,
        id: i64,
        resolver: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<Option<(Notification, bool)>, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .map(|n| {
                let newly = !n.is_resolved;
                n.resolve(resolver, now);
                (n.clone(), newly)
            }))
    }

    /// Deletes a notification.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn delete_notification(&self, id: i64) -> Result<bool, GatewayError> {
        let mut state = self.state.write().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        Ok(state.notifications.len() < before)
    }

    /// Counts unread, unresolved notifications.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn unread_notification_count(&self) -> Result<i64, GatewayError> {
        let state = self.state.read().await;
        let count = state
            .notifications
            .iter()
            .filter(|n| !n.is_read && !n.is_resolved)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    /// Daily wet/dry averages inside `range`, ascending.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn daily_averages(
        &self,
        range: &DateRange,
        dustbin: Option<&DustbinId>,
    ) -> Result<Vec<DailyAverage>, GatewayError> {
        let state = self.state.read().await;
        let samples = state
            .history
            .iter()
            .filter(|s| dustbin.is_none_or(|id| &s.dustbin_id == id));
        Ok(analytics::daily_averages(samples, range))
    }

    /// Daily fleet rollups since `since`, newest first.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn daily_trends(&self, since: DateTime<Utc>) -> Result<Vec<DailyTrend>, GatewayError> {
        let state = self.state.read().await;
        Ok(analytics::daily_trends(&state.history, since))
    }

    /// Snapshot rollup of the active fleet.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn fleet_summary(&self, now: DateTime<Utc>) -> Result<FleetSummary, GatewayError> {
        let state = self.state.read().await;
        Ok(FleetSummary::compute(&state.active(), &state.history, now))
    }

    /// Looks up login credentials by normalised email.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, GatewayError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.user.email == email).cloned())
    }

    /// Creates a user unless the email is taken.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn insert_user_if_absent(
        &self,
        email: &str,
        name: &str,
        role: &str,
        password_hash: &str,
    ) -> Result<bool, GatewayError> {
        let mut state = self.state.write().await;
        if state.users.iter().any(|u| u.user.email == email) {
            return Ok(false);
        }
        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            email: email.to_string(),
            name: name.to_string(),
            role: role.to_string(),
        };
        state.users.push(UserCredentials {
            user,
            password_hash: password_hash.to_string(),
        });
        Ok(true)
    }

    /// Stores a session and drops every session expired at `now`.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn create_session(
        &self,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut state = self.state.write().await;
        state.sessions.retain(|_, s| s.is_valid_at(now));
        state
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    /// Resolves an unexpired session token to its user.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn session_user(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, GatewayError> {
        let state = self.state.read().await;
        let Some(session) = state.sessions.get(token).filter(|s| s.is_valid_at(now)) else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|u| u.user.id == session.user_id)
            .map(|u| u.user.clone()))
    }

    /// Revokes a session.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn delete_session(&self, token: &str) -> Result<bool, GatewayError> {
        let mut state = self.state.write().await;
        Ok(state.sessions.remove(token).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::renumber::is_contiguous;
    use chrono::Duration;

    fn reading(overall: i32) -> FillReading {
        let Ok(r) = FillReading::new(Some(overall), Some(overall), Some(overall), None) else {
            panic!("valid reading");
        };
        r
    }

    async fn store_with(locations: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        for loc in locations {
            let Ok(_) = store.insert_dustbin(loc, Utc::now()).await else {
                panic!("insert");
            };
        }
        store
    }

    async fn ids(store: &MemoryStore) -> Vec<String> {
        let Ok(list) = store.list_dustbins().await else {
            panic!("list");
        };
        list.into_iter().map(|b| b.id.into_inner()).collect()
    }

    #[tokio::test]
    async fn inserts_use_next_sequential_id() {
        let store = store_with(&["A", "B"]).await;
        assert_eq!(ids(&store).await, vec!["001", "002"]);
        let Ok(bin) = store.insert_dustbin("C", Utc::now()).await else {
            panic!("insert");
        };
        assert_eq!(bin.id.as_str(), "003");
        assert_eq!(bin.name, "Dustbin #003");
    }

    #[tokio::test]
    async fn removal_renumbers_and_moves_history() {
        let store = store_with(&["A", "B", "C", "D"]).await;
        let now = Utc::now();
        let c = DustbinId::from_position(3);
        let Ok(Some(_)) = store.apply_reading(&c, &reading(30), now).await else {
            panic!("reading");
        };

        let Ok(outcome) = store
            .remove_and_renumber(&[DustbinId::from_position(2)], now)
            .await
        else {
            panic!("remove");
        };
        assert_eq!(outcome.removed, vec![DustbinId::from_position(2)]);
        assert_eq!(outcome.reassigned.len(), 2);
        let locations: Vec<&str> = outcome.dustbins.iter().map(|b| b.location.as_str()).collect();
        assert_eq!(locations, vec!["A", "C", "D"]);
        assert_eq!(ids(&store).await, vec!["001", "002", "003"]);

        // C's sample now belongs to "002".
        let range = DateRange {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
        };
        let Ok(series) = store
            .daily_averages(&range, Some(&DustbinId::from_position(2)))
            .await
        else {
            panic!("analytics");
        };
        assert_eq!(series.len(), 1);
    }

    #[tokio::test]
    async fn retired_history_does_not_follow_survivor() {
        let store = store_with(&["A", "B"]).await;
        let now = Utc::now();
        let Ok(Some(_)) = store
            .apply_reading(&DustbinId::from_position(1), &reading(50), now)
            .await
        else {
            panic!("reading");
        };
        let Ok(_) = store
            .remove_and_renumber(&[DustbinId::from_position(1)], now)
            .await
        else {
            panic!("remove");
        };
        let range = DateRange {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
        };
        let Ok(series) = store
            .daily_averages(&range, Some(&DustbinId::from_position(1)))
            .await
        else {
            panic!("analytics");
        };
        assert!(series.is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_ids_still_compacts() {
        let store = store_with(&["A", "B", "C"]).await;
        let Ok(first) = store
            .remove_and_renumber(&[DustbinId::from_position(2)], Utc::now())
            .await
        else {
            panic!("remove");
        };
        assert_eq!(first.removed.len(), 1);

        let Ok(second) = store
            .remove_and_renumber(&[DustbinId::from_raw("999")], Utc::now())
            .await
        else {
            panic!("remove");
        };
        assert!(second.removed.is_empty());
        assert!(second.reassigned.is_empty());
        let fleet: Vec<DustbinId> = second.dustbins.into_iter().map(|b| b.id).collect();
        assert!(is_contiguous(&fleet));
    }

    #[tokio::test]
    async fn crossing_raises_exactly_one_notification() {
        let store = store_with(&["A", "B", "C"]).await;
        let t0 = Utc::now();
        for (pos, level) in [(1, 92), (2, 55), (3, 81)] {
            let Ok(Some(_)) = store
                .apply_reading(&DustbinId::from_position(pos), &reading(level), t0 + Duration::seconds(i64::from(pos)))
                .await
            else {
                panic!("reading");
            };
        }
        let Ok(Some(again)) = store
            .apply_reading(&DustbinId::from_position(1), &reading(95), t0 + Duration::minutes(1))
            .await
        else {
            panic!("reading");
        };
        assert_eq!(again.transition, CriticalTransition::Sustained);
        assert!(again.notification.is_none());

        let Ok(list) = store.active_notifications().await else {
            panic!("list");
        };
        let bins: Vec<&str> = list.iter().map(|n| n.dustbin_id.as_str()).collect();
        assert_eq!(bins, vec!["003", "001"]);
        assert_eq!(store.unread_notification_count().await.ok(), Some(2));
    }

    #[tokio::test]
    async fn resolve_is_idempotent_and_hides_notification() {
        let store = store_with(&["A"]).await;
        let now = Utc::now();
        let Ok(Some(outcome)) = store
            .apply_reading(&DustbinId::from_position(1), &reading(90), now)
            .await
        else {
            panic!("reading");
        };
        let Some(note) = outcome.notification else {
            panic!("notification expected");
        };

        let Ok(Some((first, newly))) = store.resolve_notification(note.id, Some(1), now).await
        else {
            panic!("resolve");
        };
        assert!(newly);
        assert_eq!(first.resolved_by, Some(1));

        let Ok(Some((second, newly))) = store
            .resolve_notification(note.id, Some(2), now + Duration::minutes(1))
            .await
        else {
            panic!("resolve");
        };
        assert!(!newly);
        assert_eq!(second.resolved_by, Some(1));
        assert_eq!(store.active_notifications().await.ok().map(|l| l.len()), Some(0));
        assert_eq!(store.unread_notification_count().await.ok(), Some(0));
    }

    #[tokio::test]
    async fn unknown_bin_reading_is_none() {
        let store = MemoryStore::new();
        let result = store
            .apply_reading(&DustbinId::from_position(1), &reading(10), Utc::now())
            .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn sessions_expire() {
        let store = MemoryStore::new();
        let Ok(true) = store
            .insert_user_if_absent("ops@example.com", "Ops", "operator", "hash")
            .await
        else {
            panic!("insert user");
        };
        assert_eq!(
            store
                .insert_user_if_absent("ops@example.com", "Ops", "operator", "hash")
                .await
                .ok(),
            Some(false)
        );

        let now = Utc::now();
        let session = Session {
            token: "t".to_string(),
            user_id: 1,
            expires_at: now + Duration::hours(1),
        };
        let Ok(()) = store.create_session(&session, now).await else {
            panic!("session");
        };
        let Ok(Some(user)) = store.session_user("t", now).await else {
            panic!("user expected");
        };
        assert_eq!(user.email, "ops@example.com");
        assert!(matches!(
            store.session_user("t", now + Duration::hours(2)).await,
            Ok(None)
        ));
        assert_eq!(store.delete_session("t").await.ok(), Some(true));
    }

    #[tokio::test]
    async fn login_prunes_expired_sessions() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let stale = Session {
            token: "stale".to_string(),
            user_id: 1,
            expires_at: now - Duration::minutes(1),
        };
        let live = Session {
            token: "live".to_string(),
            user_id: 1,
            expires_at: now + Duration::hours(1),
        };
        let Ok(()) = store.create_session(&stale, now - Duration::hours(1)).await else {
            panic!("stale session");
        };
        let Ok(()) = store.create_session(&live, now).await else {
            panic!("live session");
        };

        let state = store.state.read().await;
        assert!(!state.sessions.contains_key("stale"));
        assert!(state.sessions.contains_key("live"));
    }

    #[tokio::test]
    async fn seeded_store_serves_demo_fleet() {
        let store = MemoryStore::seeded(Utc::now());
        assert_eq!(ids(&store).await.len(), 8);
        assert_eq!(store.unread_notification_count().await.ok(), Some(3));
        let Ok(summary) = store.fleet_summary(Utc::now()).await else {
            panic!("summary");
        };
        assert_eq!(summary.total_dustbins, 8);
        assert_eq!(summary.critical_dustbins, 3);
        assert_eq!(summary.low_battery_dustbins, 1);
    }
}
