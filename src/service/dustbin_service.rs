//! Dustbin service: fleet CRUD, renumbering and sensor ingestion.

use chrono::Utc;

use crate::domain::{CriticalTransition, Dustbin, DustbinEvent, DustbinId, EventBus, FillReading};
use crate::error::GatewayError;
use crate::persistence::{DataSource, RemovalOutcome};

/// Orchestration layer for bin operations.
///
/// Every mutation follows the pattern: validate → store (atomically) →
/// emit events → return result.
#[derive(Debug, Clone)]
pub struct DustbinService {
    store: DataSource,
    event_bus: EventBus,
}

impl DustbinService {
    /// Creates a new `DustbinService`.
    #[must_use]
    pub fn new(store: DataSource, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Lists active bins in identifier order.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] on storage failure.
    pub async fn list(&self) -> Result<Vec<Dustbin>, GatewayError> {
        self.store.list_dustbins().await
    }

    /// Fetches one active bin.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DustbinNotFound`] if no active bin has `id`.
    pub async fn get(&self, id: &DustbinId) -> Result<Dustbin, GatewayError> {
        self.store
            .get_dustbin(id)
            .await?
            .ok_or_else(|| GatewayError::DustbinNotFound(id.to_string()))
    }

    /// Adds a bin at `location` with the next sequential identifier.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if the location is missing
    /// or blank.
    pub async fn create(&self, location: Option<&str>) -> Result<Dustbin, GatewayError> {
        let location = require_location(location)?;
        let now = Utc::now();
        let bin = self.store.insert_dustbin(location, now).await?;

        let _ = self.event_bus.publish(DustbinEvent::DustbinAdded {
            dustbin_id: bin.id.clone(),
            location: bin.location.clone(),
            timestamp: now,
        });
        tracing::info!(dustbin_id = %bin.id, location = %bin.location, "dustbin added");
        Ok(bin)
    }

    /// Changes the location of an active bin.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank location and
    /// [`GatewayError::DustbinNotFound`] for an unknown bin.
    pub async fn update_location(
        &self,
        id: &DustbinId,
        location: Option<&str>,
    ) -> Result<Dustbin, GatewayError> {
        let location = require_location(location)?;
        let now = Utc::now();
        let bin = self
            .store
            .update_location(id, location, now)
            .await?
            .ok_or_else(|| GatewayError::DustbinNotFound(id.to_string()))?;

        let _ = self.event_bus.publish(DustbinEvent::DustbinUpdated {
            dustbin_id: bin.id.clone(),
            location: bin.location.clone(),
            timestamp: now,
        });
        tracing::info!(dustbin_id = %bin.id, location = %bin.location, "dustbin updated");
        Ok(bin)
    }

    /// Retires the given bins and renumbers the rest of the fleet.
    ///
    /// Identifiers that match no active bin are ignored; the fleet is
    /// compacted either way.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when `ids` is missing or
    /// empty, or a storage error (in which case nothing changed).
    pub async fn remove(&self, ids: Option<Vec<String>>) -> Result<RemovalOutcome, GatewayError> {
        let mut ids: Vec<DustbinId> = ids
            .unwrap_or_default()
            .into_iter()
            .map(DustbinId::from)
            .collect();
        if ids.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "dustbinIds array is required".to_string(),
            ));
        }
        ids.sort();
        ids.dedup();

        let now = Utc::now();
        let outcome = self.store.remove_and_renumber(&ids, now).await?;

        if !outcome.removed.is_empty() || !outcome.reassigned.is_empty() {
            let _ = self.event_bus.publish(DustbinEvent::DustbinsRemoved {
                removed: outcome.removed.clone(),
                reassigned: outcome.reassigned.clone(),
                timestamp: now,
            });
        }
        tracing::info!(
            removed = outcome.removed.len(),
            renumbered = outcome.reassigned.len(),
            remaining = outcome.dustbins.len(),
            "dustbins renumbered"
        );
        Ok(outcome)
    }

    /// Ingests a sensor reading for one bin.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DustbinNotFound`] for an unknown bin.
    pub async fn record_reading(
        &self,
        id: &DustbinId,
        reading: FillReading,
    ) -> Result<Dustbin, GatewayError> {
        let now = Utc::now();
        let outcome = self
            .store
            .apply_reading(id, &reading, now)
            .await?
            .ok_or_else(|| GatewayError::DustbinNotFound(id.to_string()))?;
        let bin = outcome.dustbin;

        let _ = self.event_bus.publish(DustbinEvent::FillLevelUpdated {
            dustbin_id: bin.id.clone(),
            overall_fill_level: bin.overall_fill_level,
            wet_waste_fill_level: bin.wet_waste_fill_level,
            dry_waste_fill_level: bin.dry_waste_fill_level,
            battery_level: bin.battery_level,
            timestamp: now,
        });

        if let Some(note) = outcome.notification {
            let _ = self.event_bus.publish(DustbinEvent::CriticalAlert {
                notification_id: note.id,
                dustbin_id: note.dustbin_id.clone(),
                location: note.dustbin_location.clone(),
                fill_level: note.fill_level,
                critical_timestamp: note.critical_timestamp,
            });
            tracing::warn!(
                dustbin_id = %bin.id,
                fill_level = note.fill_level,
                notification_id = note.id,
                "critical alert raised"
            );
        } else if outcome.transition == CriticalTransition::Cleared {
            tracing::info!(dustbin_id = %bin.id, "dustbin back below critical level");
        }

        Ok(bin)
    }
}

/// Trims a location and rejects blanks.
fn require_location(location: Option<&str>) -> Result<&str, GatewayError> {
    location
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| GatewayError::InvalidRequest("Location is required".to_string()))
}
