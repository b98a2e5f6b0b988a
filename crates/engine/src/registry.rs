//! Zone registry with atomic snapshot reads.
//!
//! Edits build a new snapshot and publish it by swapping an `Arc`
//! pointer under a short write lock; readers clone the pointer and
//! never observe a partially-updated zone.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use domain::Zone;

use crate::error::EngineError;

/// Immutable view of the zone set at one version.
#[derive(Debug, Default)]
pub struct ZoneSnapshot {
    zones: HashMap<Uuid, Arc<Zone>>,
    version: u64,
}

impl ZoneSnapshot {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Outcome of a zone upsert.
#[derive(Debug)]
pub struct UpsertOutcome {
    /// True when the zone did not exist before.
    pub created: bool,
    /// Vehicles that were assigned before the edit and no longer are;
    /// their membership state for this zone must be cleaned up.
    pub unassigned: Vec<Uuid>,
}

/// Read seam between the evaluation pipeline and the zone store. Lets
/// the tracker treat the registry as a dependency that may be
/// temporarily unavailable.
pub trait ZoneProvider: Send + Sync {
    /// Zones that are active and have the vehicle assigned.
    fn active_zones_for(&self, vehicle_id: Uuid) -> Result<Vec<Arc<Zone>>, EngineError>;
}

/// Holds the current set of zone definitions and their vehicle
/// assignments. Sole owner of zone records.
pub struct ZoneRegistry {
    snapshot: RwLock<Arc<ZoneSnapshot>>,
}

impl Default for ZoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(ZoneSnapshot::default())),
        }
    }

    /// Current snapshot pointer. Cheap; clones only the `Arc`.
    pub fn snapshot(&self) -> Arc<ZoneSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn version(&self) -> u64 {
        self.snapshot().version
    }

    pub fn zone_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn get(&self, zone_id: Uuid) -> Option<Arc<Zone>> {
        self.snapshot().zones.get(&zone_id).cloned()
    }

    /// All zones, unordered.
    pub fn list(&self) -> Vec<Arc<Zone>> {
        self.snapshot().zones.values().cloned().collect()
    }

    /// Creates or replaces a zone after validating its definition.
    pub fn upsert(&self, zone: Zone) -> Result<UpsertOutcome, EngineError> {
        zone.validate_definition()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let previous = guard.zones.get(&zone.zone_id);
        let unassigned: Vec<Uuid> = previous
            .map(|prev| {
                prev.vehicle_ids
                    .difference(&zone.vehicle_ids)
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        let created = previous.is_none();

        let mut zones = guard.zones.clone();
        zones.insert(zone.zone_id, Arc::new(zone));
        *guard = Arc::new(ZoneSnapshot {
            zones,
            version: guard.version + 1,
        });

        Ok(UpsertOutcome {
            created,
            unassigned,
        })
    }

    /// Removes a zone, returning its last definition.
    pub fn delete(&self, zone_id: Uuid) -> Result<Arc<Zone>, EngineError> {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut zones = guard.zones.clone();
        let removed = zones
            .remove(&zone_id)
            .ok_or_else(|| EngineError::NotFound(format!("Zone {zone_id} not found")))?;

        *guard = Arc::new(ZoneSnapshot {
            zones,
            version: guard.version + 1,
        });

        Ok(removed)
    }
}

impl ZoneProvider for ZoneRegistry {
    fn active_zones_for(&self, vehicle_id: Uuid) -> Result<Vec<Arc<Zone>>, EngineError> {
        let snapshot = self.snapshot();
        Ok(snapshot
            .zones
            .values()
            .filter(|z| z.active && z.vehicle_ids.contains(&vehicle_id))
            .cloned()
            .collect())
    }
}

/// Builds a zone's vehicle assignment set from a list.
pub fn vehicle_id_set(ids: &[Uuid]) -> HashSet<Uuid> {
    ids.iter().copied().collect()
}
