//! Alert generation from transitions and policy checks.
//!
//! Consumes membership transitions plus the current containment set,
//! applies the zone's enabled alert kinds, the severity policy, and the
//! re-alert suppression window, and emits alert records.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use domain::services::severity::SeverityPolicy;
use domain::services::time_window;
use domain::{Alert, AlertKind, VehiclePosition, Zone, ZoneTransition};

use crate::tracker::Evaluation;

/// Alert generator with per-(vehicle, zone, kind) suppression state.
pub struct AlertGenerator {
    policy: SeverityPolicy,
    suppression_window: Duration,
    last_emitted: DashMap<(Uuid, Uuid, AlertKind), DateTime<Utc>>,
}

impl AlertGenerator {
    pub fn new(policy: SeverityPolicy, suppression_window_secs: u64) -> Self {
        Self {
            policy,
            suppression_window: Duration::seconds(suppression_window_secs as i64),
            last_emitted: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    /// Produces the alerts for one evaluated position report.
    /// `secured` is the operator-set anti-theft flag for the vehicle.
    pub fn process(
        &self,
        position: &VehiclePosition,
        zones: &[Arc<Zone>],
        evaluation: &Evaluation,
        secured: bool,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();

        for transition in &evaluation.transitions {
            let Some(zone) = zones.iter().find(|z| z.zone_id == transition.zone_id) else {
                continue;
            };
            self.process_transition(position, zone, transition, secured, &mut alerts);
        }

        for zone in zones {
            let inside = evaluation
                .containment
                .get(&zone.zone_id)
                .copied()
                .unwrap_or(false);
            if !inside {
                continue;
            }
            self.check_speed(position, zone, &mut alerts);
            self.check_time(position, zone, &mut alerts);
        }

        alerts
    }

    fn process_transition(
        &self,
        position: &VehiclePosition,
        zone: &Zone,
        transition: &ZoneTransition,
        secured: bool,
        alerts: &mut Vec<Alert>,
    ) {
        if transition.to {
            if zone.alerts_enabled(AlertKind::Entry) {
                alerts.push(self.build_alert(
                    position,
                    zone,
                    AlertKind::Entry,
                    None,
                    format!("Vehicle entered zone '{}'", zone.name),
                ));
            }
            return;
        }

        if zone.alerts_enabled(AlertKind::Exit) {
            alerts.push(self.build_alert(
                position,
                zone,
                AlertKind::Exit,
                None,
                format!("Vehicle exited zone '{}'", zone.name),
            ));
        }

        // Derived theft detection: an exit while the vehicle is secured
        // or outside the zone's allowed hours is always critical and is
        // never suppressed or gated on the zone's configured kinds.
        let out_of_hours =
            !time_window::within_window(zone.time_restriction.as_ref(), position.timestamp);
        if secured || (zone.time_restriction.is_some() && out_of_hours) {
            let reason = if secured {
                "while secured"
            } else {
                "outside allowed hours"
            };
            alerts.push(self.build_alert(
                position,
                zone,
                AlertKind::Theft,
                None,
                format!(
                    "Possible theft: vehicle exited zone '{}' {}",
                    zone.name, reason
                ),
            ));
        }
    }

    fn check_speed(&self, position: &VehiclePosition, zone: &Zone, alerts: &mut Vec<Alert>) {
        let Some(limit) = zone.speed_limit_kmh else {
            return;
        };
        if !zone.alerts_enabled(AlertKind::Speed) || position.speed_kmh <= limit {
            return;
        }
        if self.suppressed(position, zone, AlertKind::Speed) {
            return;
        }

        let overage = position.speed_kmh / limit - 1.0;
        alerts.push(self.build_alert(
            position,
            zone,
            AlertKind::Speed,
            Some(overage),
            format!(
                "Speed {:.0} km/h exceeds limit {:.0} km/h in zone '{}'",
                position.speed_kmh, limit, zone.name
            ),
        ));
        self.mark_emitted(position, zone, AlertKind::Speed);
    }

    fn check_time(&self, position: &VehiclePosition, zone: &Zone, alerts: &mut Vec<Alert>) {
        if zone.time_restriction.is_none() || !zone.alerts_enabled(AlertKind::Time) {
            return;
        }
        if time_window::within_window(zone.time_restriction.as_ref(), position.timestamp) {
            return;
        }
        if self.suppressed(position, zone, AlertKind::Time) {
            return;
        }

        alerts.push(self.build_alert(
            position,
            zone,
            AlertKind::Time,
            None,
            format!(
                "Vehicle present in zone '{}' outside allowed hours",
                zone.name
            ),
        ));
        self.mark_emitted(position, zone, AlertKind::Time);
    }

    fn suppressed(&self, position: &VehiclePosition, zone: &Zone, kind: AlertKind) -> bool {
        self.last_emitted
            .get(&(position.vehicle_id, zone.zone_id, kind))
            .map(|last| position.timestamp - *last < self.suppression_window)
            .unwrap_or(false)
    }

    fn mark_emitted(&self, position: &VehiclePosition, zone: &Zone, kind: AlertKind) {
        self.last_emitted.insert(
            (position.vehicle_id, zone.zone_id, kind),
            position.timestamp,
        );
    }

    fn build_alert(
        &self,
        position: &VehiclePosition,
        zone: &Zone,
        kind: AlertKind,
        overage_ratio: Option<f64>,
        description: String,
    ) -> Alert {
        Alert {
            alert_id: Alert::deterministic_id(
                position.vehicle_id,
                zone.zone_id,
                kind,
                position.timestamp,
            ),
            zone_id: zone.zone_id,
            vehicle_id: position.vehicle_id,
            kind,
            severity: self.policy.classify(kind, zone, overage_ratio),
            timestamp: position.timestamp,
            location: position.location(),
            description,
            acknowledged: false,
            acknowledged_at: None,
        }
    }

    /// Drops suppression state for a deleted zone.
    pub fn remove_zone(&self, zone_id: Uuid) {
        self.last_emitted.retain(|(_, z, _), _| *z != zone_id);
    }
}
