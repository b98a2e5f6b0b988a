//! Engine facade.
//!
//! Wires the zone registry, membership tracker, alert generator, alert
//! store and ingestion dispatcher together behind one handle that the
//! HTTP layer talks to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use metrics::counter;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use domain::services::severity::SeverityPolicy;
use domain::{Alert, AlertFilter, VehiclePosition, Zone};

use crate::dispatcher::{IngestionDispatcher, PositionProcessor};
use crate::error::EngineError;
use crate::generator::AlertGenerator;
use crate::notifier::{AlertNotification, NotificationDispatcher};
use crate::registry::{ZoneProvider, ZoneRegistry};
use crate::store::AlertStore;
use crate::tracker::MembershipTracker;

fn default_queue_capacity() -> usize {
    16
}

fn default_suppression_window_secs() -> u64 {
    300
}

fn default_hysteresis_m() -> f64 {
    0.0
}

/// Engine tuning knobs, loaded from the `engine` config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pending reports held per vehicle before coalescing kicks in.
    pub queue_capacity: usize,
    /// Re-alert suppression window for speed and time alerts.
    pub suppression_window_secs: u64,
    /// Exit-side debounce margin in meters for circular zones.
    pub hysteresis_m: f64,
    pub severity: SeverityPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            suppression_window_secs: default_suppression_window_secs(),
            hysteresis_m: default_hysteresis_m(),
            severity: SeverityPolicy::default(),
        }
    }
}

/// Point-in-time engine health, exposed on the health endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineHealth {
    pub zone_count: usize,
    pub zone_version: u64,
    pub tracked_vehicles: usize,
    pub alert_count: usize,
    pub active_workers: usize,
    /// True while the zone provider is unreachable; evaluation is
    /// skipped and retried on each vehicle's next report.
    pub degraded: bool,
}

/// The evaluation pipeline shared by all per-vehicle workers.
struct EngineCore {
    provider: Arc<dyn ZoneProvider>,
    tracker: MembershipTracker,
    generator: AlertGenerator,
    store: AlertStore,
    notifier: Arc<dyn NotificationDispatcher>,
    secured: DashSet<Uuid>,
    degraded: AtomicBool,
}

#[async_trait::async_trait]
impl PositionProcessor for EngineCore {
    async fn process(&self, position: VehiclePosition) {
        let zones = match self.provider.active_zones_for(position.vehicle_id) {
            Ok(zones) => zones,
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                counter!("fleetguard_degraded_evaluations_total").increment(1);
                tracing::warn!(
                    vehicle_id = %position.vehicle_id,
                    error = %e,
                    "Zone provider unavailable, skipping evaluation"
                );
                return;
            }
        };
        self.degraded.store(false, Ordering::Relaxed);

        let evaluation = match self.tracker.evaluate(&position, &zones) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                counter!("fleetguard_positions_rejected_total").increment(1);
                tracing::debug!(
                    vehicle_id = %position.vehicle_id,
                    error = %e,
                    "Position rejected during evaluation"
                );
                return;
            }
        };

        let secured = self.secured.contains(&position.vehicle_id);
        let alerts = self
            .generator
            .process(&position, &zones, &evaluation, secured);

        for alert in alerts {
            if !self.store.insert(alert.clone()) {
                continue;
            }
            counter!("fleetguard_alerts_generated_total", "kind" => alert.kind.as_str())
                .increment(1);
            self.notifier.dispatch(AlertNotification::from(&alert)).await;
        }
        counter!("fleetguard_positions_processed_total").increment(1);
    }
}

/// Public engine handle. Cheap to clone via `Arc` at the call sites.
pub struct GeofenceEngine {
    core: Arc<EngineCore>,
    registry: Arc<ZoneRegistry>,
    dispatcher: IngestionDispatcher,
    /// Last accepted timestamp per vehicle, checked at the ingest
    /// boundary so stale reports are rejected synchronously.
    last_accepted: DashMap<Uuid, DateTime<Utc>>,
}

impl GeofenceEngine {
    pub fn new(config: EngineConfig, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        let registry = Arc::new(ZoneRegistry::new());
        Self::with_provider(config, notifier, registry.clone(), registry)
    }

    /// Builds an engine with an injected zone provider. The registry is
    /// still used for zone management; tests pass a failing provider to
    /// exercise degraded evaluation.
    pub fn with_provider(
        config: EngineConfig,
        notifier: Arc<dyn NotificationDispatcher>,
        provider: Arc<dyn ZoneProvider>,
        registry: Arc<ZoneRegistry>,
    ) -> Self {
        let core = Arc::new(EngineCore {
            provider,
            tracker: MembershipTracker::new(config.hysteresis_m),
            generator: AlertGenerator::new(
                config.severity.clone(),
                config.suppression_window_secs,
            ),
            store: AlertStore::new(),
            notifier,
            secured: DashSet::new(),
            degraded: AtomicBool::new(false),
        });
        let dispatcher = IngestionDispatcher::new(core.clone(), config.queue_capacity);

        Self {
            core,
            registry,
            dispatcher,
            last_accepted: DashMap::new(),
        }
    }

    /// Accepts a position report for asynchronous evaluation. Rejects
    /// reports not strictly newer than the vehicle's last accepted one.
    pub fn ingest(&self, position: VehiclePosition) -> Result<(), EngineError> {
        {
            let mut last = self.last_accepted.entry(position.vehicle_id).or_insert(
                DateTime::<Utc>::MIN_UTC,
            );
            if position.timestamp <= *last {
                counter!("fleetguard_positions_rejected_total").increment(1);
                return Err(EngineError::Validation(format!(
                    "Out-of-order position for vehicle {}: {} is not after {}",
                    position.vehicle_id, position.timestamp, *last
                )));
            }
            *last = position.timestamp;
        }

        counter!("fleetguard_positions_ingested_total").increment(1);
        self.dispatcher.submit(position);
        Ok(())
    }

    pub fn severity_policy(&self) -> &SeverityPolicy {
        self.core.generator.policy()
    }

    /// Creates or replaces a zone. Returns true when newly created.
    pub fn upsert_zone(&self, zone: Zone) -> Result<bool, EngineError> {
        let zone_id = zone.zone_id;
        let outcome = self.registry.upsert(zone)?;
        if !outcome.unassigned.is_empty() {
            self.core
                .tracker
                .remove_assignments(zone_id, &outcome.unassigned);
        }
        tracing::info!(
            zone_id = %zone_id,
            created = outcome.created,
            "Zone definition applied"
        );
        Ok(outcome.created)
    }

    pub fn get_zone(&self, zone_id: Uuid) -> Result<Arc<Zone>, EngineError> {
        self.registry
            .get(zone_id)
            .ok_or_else(|| EngineError::NotFound(format!("Zone {zone_id} not found")))
    }

    pub fn list_zones(&self) -> Vec<Arc<Zone>> {
        self.registry.list()
    }

    pub fn delete_zone(&self, zone_id: Uuid) -> Result<Arc<Zone>, EngineError> {
        let removed = self.registry.delete(zone_id)?;
        self.core.tracker.remove_zone(zone_id);
        self.core.generator.remove_zone(zone_id);
        tracing::info!(zone_id = %zone_id, "Zone deleted");
        Ok(removed)
    }

    pub fn list_alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.core.store.list(filter)
    }

    pub fn acknowledge_alert(&self, alert_id: Uuid) -> Result<Alert, EngineError> {
        self.core.store.acknowledge(alert_id)
    }

    /// Sets the anti-theft flag for a vehicle. Returns the previous
    /// value.
    pub fn set_secured(&self, vehicle_id: Uuid, secured: bool) -> bool {
        if secured {
            !self.core.secured.insert(vehicle_id)
        } else {
            self.core.secured.remove(&vehicle_id).is_some()
        }
    }

    pub fn is_secured(&self, vehicle_id: Uuid) -> bool {
        self.core.secured.contains(&vehicle_id)
    }

    pub fn health(&self) -> EngineHealth {
        EngineHealth {
            zone_count: self.registry.zone_count(),
            zone_version: self.registry.version(),
            tracked_vehicles: self.core.tracker.tracked_vehicles(),
            alert_count: self.core.store.len(),
            active_workers: self.dispatcher.worker_count(),
            degraded: self.core.degraded.load(Ordering::Relaxed),
        }
    }
}
