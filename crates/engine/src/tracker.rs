//! Per-vehicle membership tracking.
//!
//! Holds the "currently inside" flag per (vehicle, zone) pair and turns
//! fresh containment results into transition events. State for a
//! vehicle is only ever mutated by that vehicle's own position stream;
//! the ingestion dispatcher guarantees those evaluations are strictly
//! sequential.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use domain::services::geometry;
use domain::{MembershipState, VehiclePosition, Zone, ZoneTransition};

use crate::error::EngineError;

/// Result of evaluating one position report against the vehicle's
/// active zones.
#[derive(Debug)]
pub struct Evaluation {
    /// One transition per zone whose containment flag flipped.
    pub transitions: Vec<ZoneTransition>,
    /// Post-evaluation containment per zone id.
    pub containment: HashMap<Uuid, bool>,
}

#[derive(Debug, Default)]
struct VehicleMembership {
    last_timestamp: Option<DateTime<Utc>>,
    zones: HashMap<Uuid, MembershipState>,
}

/// Tracks containment state per (vehicle, zone) pair.
pub struct MembershipTracker {
    vehicles: DashMap<Uuid, VehicleMembership>,
    /// Exit-side hysteresis margin in meters for circular zones;
    /// 0 disables debouncing.
    hysteresis_m: f64,
}

impl MembershipTracker {
    pub fn new(hysteresis_m: f64) -> Self {
        Self {
            vehicles: DashMap::new(),
            hysteresis_m,
        }
    }

    /// Evaluates a position against the vehicle's zones and returns the
    /// transitions. Rejects out-of-order or duplicate timestamps for
    /// the vehicle. Stored state is committed only after the full
    /// transition list has been produced.
    pub fn evaluate(
        &self,
        position: &VehiclePosition,
        zones: &[Arc<Zone>],
    ) -> Result<Evaluation, EngineError> {
        let mut entry = self.vehicles.entry(position.vehicle_id).or_default();

        if let Some(last) = entry.last_timestamp {
            if position.timestamp <= last {
                return Err(EngineError::Validation(format!(
                    "Out-of-order position for vehicle {}: {} is not after {}",
                    position.vehicle_id, position.timestamp, last
                )));
            }
        }

        let location = position.location();
        let mut transitions = Vec::new();
        let mut containment = HashMap::with_capacity(zones.len());
        let mut new_states: Vec<(Uuid, MembershipState)> = Vec::with_capacity(zones.len());

        for zone in zones {
            let was_inside = entry
                .zones
                .get(&zone.zone_id)
                .map(|s| s.inside)
                .unwrap_or(false);

            // A vehicle already inside only flips to outside once it is
            // beyond the hysteresis margin.
            let margin = if was_inside { self.hysteresis_m } else { 0.0 };
            let inside = geometry::contains_with_exit_margin(&zone.geometry, location, margin);

            if inside != was_inside {
                transitions.push(ZoneTransition {
                    zone_id: zone.zone_id,
                    vehicle_id: position.vehicle_id,
                    from: was_inside,
                    to: inside,
                    timestamp: position.timestamp,
                    location,
                });
            }

            containment.insert(zone.zone_id, inside);
            new_states.push((
                zone.zone_id,
                MembershipState {
                    inside,
                    evaluated_at: position.timestamp,
                },
            ));
        }

        // Commit after the transition list is complete.
        for (zone_id, state) in new_states {
            entry.zones.insert(zone_id, state);
        }
        entry.last_timestamp = Some(position.timestamp);

        Ok(Evaluation {
            transitions,
            containment,
        })
    }

    /// Drops all membership state for a deleted zone.
    pub fn remove_zone(&self, zone_id: Uuid) {
        for mut vehicle in self.vehicles.iter_mut() {
            vehicle.zones.remove(&zone_id);
        }
    }

    /// Drops membership state for vehicles no longer assigned to a zone.
    pub fn remove_assignments(&self, zone_id: Uuid, unassigned: &[Uuid]) {
        for vehicle_id in unassigned {
            if let Some(mut vehicle) = self.vehicles.get_mut(vehicle_id) {
                vehicle.zones.remove(&zone_id);
            }
        }
    }

    /// Number of vehicles with tracked state.
    pub fn tracked_vehicles(&self) -> usize {
        self.vehicles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use domain::models::alert::AlertKind;
    use domain::{LatLng, ZoneGeometry};
    use std::collections::HashSet;

    const CENTER: LatLng = LatLng {
        latitude: -26.1367,
        longitude: 28.2411,
    };
    const INSIDE: LatLng = LatLng {
        latitude: -26.1367,
        longitude: 28.2411,
    };
    const OUTSIDE: LatLng = LatLng {
        latitude: -26.0367,
        longitude: 28.2411,
    };

    fn airport_zone() -> Arc<Zone> {
        Arc::new(Zone {
            zone_id: Uuid::new_v4(),
            name: "OR Tambo Airport".to_string(),
            geometry: ZoneGeometry::Circular {
                center: CENTER,
                radius_meters: 2000.0,
            },
            vehicle_ids: HashSet::new(),
            active: true,
            alert_kinds: [AlertKind::Entry, AlertKind::Exit].into_iter().collect(),
            time_restriction: None,
            speed_limit_kmh: Some(60.0),
            restricted: false,
            created_at: Utc::now(),
        })
    }

    fn position(vehicle_id: Uuid, at: LatLng, timestamp: DateTime<Utc>) -> VehiclePosition {
        VehiclePosition {
            vehicle_id,
            latitude: at.latitude,
            longitude: at.longitude,
            speed_kmh: 40.0,
            timestamp,
        }
    }

    #[test]
    fn test_transition_only_on_flip() {
        let tracker = MembershipTracker::new(0.0);
        let zone = airport_zone();
        let zones = vec![zone.clone()];
        let vehicle = Uuid::new_v4();
        let t0 = Utc::now();

        // Containment sequence [false, true, true, false]:
        // exactly one entry and one exit.
        let points = [OUTSIDE, INSIDE, INSIDE, OUTSIDE];
        let mut all_transitions = Vec::new();
        for (i, point) in points.iter().enumerate() {
            let p = position(vehicle, *point, t0 + Duration::seconds(i as i64 + 1));
            let evaluation = tracker.evaluate(&p, &zones).unwrap();
            all_transitions.extend(evaluation.transitions);
        }

        assert_eq!(all_transitions.len(), 2);
        assert!(!all_transitions[0].from && all_transitions[0].to);
        assert!(all_transitions[1].from && !all_transitions[1].to);
        assert_eq!(all_transitions[0].zone_id, zone.zone_id);
    }

    #[test]
    fn test_first_evaluation_inside_emits_entry() {
        let tracker = MembershipTracker::new(0.0);
        let zones = vec![airport_zone()];
        let p = position(Uuid::new_v4(), INSIDE, Utc::now());

        let evaluation = tracker.evaluate(&p, &zones).unwrap();
        assert_eq!(evaluation.transitions.len(), 1);
        assert!(evaluation.transitions[0].to);
    }

    #[test]
    fn test_rejects_out_of_order_timestamp() {
        let tracker = MembershipTracker::new(0.0);
        let zones = vec![airport_zone()];
        let vehicle = Uuid::new_v4();
        let t0 = Utc::now();

        tracker
            .evaluate(&position(vehicle, OUTSIDE, t0), &zones)
            .unwrap();

        let stale = tracker.evaluate(&position(vehicle, INSIDE, t0 - Duration::seconds(1)), &zones);
        assert!(matches!(stale, Err(EngineError::Validation(_))));

        let duplicate = tracker.evaluate(&position(vehicle, INSIDE, t0), &zones);
        assert!(matches!(duplicate, Err(EngineError::Validation(_))));

        // State untouched by the rejected reports: moving inside still
        // produces the entry transition.
        let evaluation = tracker
            .evaluate(&position(vehicle, INSIDE, t0 + Duration::seconds(1)), &zones)
            .unwrap();
        assert_eq!(evaluation.transitions.len(), 1);
    }

    #[test]
    fn test_hysteresis_debounces_boundary_exit() {
        let tracker = MembershipTracker::new(500.0);
        let zone = airport_zone();
        let zones = vec![zone.clone()];
        let vehicle = Uuid::new_v4();
        let t0 = Utc::now();

        tracker
            .evaluate(&position(vehicle, INSIDE, t0), &zones)
            .unwrap();

        // ~2.2 km from center: outside the 2 km radius but within the
        // 500 m margin, so still treated as inside.
        let jitter = LatLng::new(-26.1565, 28.2411);
        let evaluation = tracker
            .evaluate(&position(vehicle, jitter, t0 + Duration::seconds(1)), &zones)
            .unwrap();
        assert!(evaluation.transitions.is_empty());
        assert!(evaluation.containment[&zone.zone_id]);

        // Far outside the margin: exit fires.
        let evaluation = tracker
            .evaluate(
                &position(vehicle, OUTSIDE, t0 + Duration::seconds(2)),
                &zones,
            )
            .unwrap();
        assert_eq!(evaluation.transitions.len(), 1);
        assert!(!evaluation.transitions[0].to);
    }

    #[test]
    fn test_remove_zone_resets_state() {
        let tracker = MembershipTracker::new(0.0);
        let zone = airport_zone();
        let zones = vec![zone.clone()];
        let vehicle = Uuid::new_v4();
        let t0 = Utc::now();

        tracker
            .evaluate(&position(vehicle, INSIDE, t0), &zones)
            .unwrap();
        tracker.remove_zone(zone.zone_id);

        // With state gone, re-entering the (re-created) zone emits a
        // fresh entry transition.
        let evaluation = tracker
            .evaluate(&position(vehicle, INSIDE, t0 + Duration::seconds(1)), &zones)
            .unwrap();
        assert_eq!(evaluation.transitions.len(), 1);
        assert!(evaluation.transitions[0].to);
    }

    #[test]
    fn test_remove_assignments_targets_single_vehicle() {
        let tracker = MembershipTracker::new(0.0);
        let zone = airport_zone();
        let zones = vec![zone.clone()];
        let dropped = Uuid::new_v4();
        let kept = Uuid::new_v4();
        let t0 = Utc::now();

        tracker
            .evaluate(&position(dropped, INSIDE, t0), &zones)
            .unwrap();
        tracker.evaluate(&position(kept, INSIDE, t0), &zones).unwrap();

        tracker.remove_assignments(zone.zone_id, &[dropped]);

        // The dropped vehicle re-enters; the kept one stays steady.
        let evaluation = tracker
            .evaluate(&position(dropped, INSIDE, t0 + Duration::seconds(1)), &zones)
            .unwrap();
        assert_eq!(evaluation.transitions.len(), 1);

        let evaluation = tracker
            .evaluate(&position(kept, INSIDE, t0 + Duration::seconds(1)), &zones)
            .unwrap();
        assert!(evaluation.transitions.is_empty());
    }
}
