//! End-to-end engine scenarios: a vehicle stream moving through zones
//! and the alerts that come out the other side.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use domain::models::zone::TimeRestriction;
use domain::{AlertFilter, AlertKind, LatLng, Severity, VehiclePosition, Zone, ZoneGeometry};
use engine::{EngineConfig, EngineError, GeofenceEngine, LogNotifier};

const AIRPORT_CENTER: LatLng = LatLng {
    latitude: -26.1367,
    longitude: 28.2411,
};
const FAR_AWAY: LatLng = LatLng {
    latitude: -26.0367,
    longitude: 28.2411,
};

fn engine() -> GeofenceEngine {
    GeofenceEngine::new(EngineConfig::default(), Arc::new(LogNotifier::new()))
}

fn airport_zone(vehicle: Uuid, kinds: &[AlertKind]) -> Zone {
    Zone {
        zone_id: Uuid::new_v4(),
        name: "OR Tambo Airport".to_string(),
        geometry: ZoneGeometry::Circular {
            center: AIRPORT_CENTER,
            radius_meters: 2000.0,
        },
        vehicle_ids: HashSet::from([vehicle]),
        active: true,
        alert_kinds: kinds.iter().copied().collect(),
        time_restriction: None,
        speed_limit_kmh: Some(60.0),
        restricted: false,
        created_at: Utc::now(),
    }
}

fn position(vehicle: Uuid, at: LatLng, speed_kmh: f64, timestamp: DateTime<Utc>) -> VehiclePosition {
    VehiclePosition {
        vehicle_id: vehicle,
        latitude: at.latitude,
        longitude: at.longitude,
        speed_kmh,
        timestamp,
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

async fn drain(engine: &GeofenceEngine, expected_alerts: usize) {
    wait_for(|| engine.list_alerts(&AlertFilter::default()).len() >= expected_alerts).await;
    // Settle so late alerts would be caught by the count assertions.
    tokio::time::sleep(StdDuration::from_millis(30)).await;
}

#[tokio::test]
async fn test_speeding_through_airport_zone() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    engine
        .upsert_zone(airport_zone(vehicle, &[AlertKind::Entry, AlertKind::Speed]))
        .unwrap();

    let t0 = Utc::now();
    // Approach from outside, then cross into the zone at 75 km/h.
    engine
        .ingest(position(vehicle, FAR_AWAY, 80.0, t0))
        .unwrap();
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 75.0, t0 + Duration::seconds(30)))
        .unwrap();
    // Still inside and still speeding a minute later: suppressed.
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 78.0, t0 + Duration::seconds(90)))
        .unwrap();

    drain(&engine, 2).await;
    let alerts = engine.list_alerts(&AlertFilter::default());
    assert_eq!(alerts.len(), 2);

    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
    assert!(kinds.contains(&AlertKind::Entry));
    assert!(kinds.contains(&AlertKind::Speed));

    let speed = alerts.iter().find(|a| a.kind == AlertKind::Speed).unwrap();
    // 75 in a 60 zone is a 25% overage, above the 20% threshold.
    assert_eq!(speed.severity, Severity::Medium);

    // Past the suppression window the speed alert fires again.
    engine
        .ingest(position(
            vehicle,
            AIRPORT_CENTER,
            80.0,
            t0 + Duration::seconds(450),
        ))
        .unwrap();
    drain(&engine, 3).await;
    let speed_alerts = engine.list_alerts(&AlertFilter {
        severity: None,
        ..Default::default()
    });
    let speed_count = speed_alerts
        .iter()
        .filter(|a| a.kind == AlertKind::Speed)
        .count();
    assert_eq!(speed_count, 2);
}

#[tokio::test]
async fn test_secured_vehicle_exit_raises_theft() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    engine
        .upsert_zone(airport_zone(vehicle, &[AlertKind::Entry, AlertKind::Exit]))
        .unwrap();
    engine.set_secured(vehicle, true);

    let t0 = Utc::now();
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 0.0, t0))
        .unwrap();
    engine
        .ingest(position(vehicle, FAR_AWAY, 60.0, t0 + Duration::seconds(60)))
        .unwrap();

    // Entry, exit, and the derived theft alert.
    drain(&engine, 3).await;
    let alerts = engine.list_alerts(&AlertFilter::default());
    assert_eq!(alerts.len(), 3);

    let theft = alerts.iter().find(|a| a.kind == AlertKind::Theft).unwrap();
    assert_eq!(theft.severity, Severity::Critical);
    assert_eq!(theft.vehicle_id, vehicle);
}

#[tokio::test]
async fn test_time_restricted_presence() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    let mut zone = airport_zone(vehicle, &[AlertKind::Time]);
    zone.time_restriction = Some(TimeRestriction {
        start_minute: 8 * 60,
        end_minute: 18 * 60,
        allowed_days: (0..=6).collect(),
        utc_offset_minutes: 120,
    });
    engine.upsert_zone(zone).unwrap();

    // 21:00 UTC is 23:00 at UTC+2, outside 08:00-18:00.
    let night = Utc.with_ymd_and_hms(2026, 8, 17, 21, 0, 0).unwrap();
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 20.0, night))
        .unwrap();

    drain(&engine, 1).await;
    let alerts = engine.list_alerts(&AlertFilter::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Time);
    assert_eq!(alerts[0].severity, Severity::Medium);
}

#[tokio::test]
async fn test_acknowledge_lifecycle_through_engine() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    engine
        .upsert_zone(airport_zone(vehicle, &[AlertKind::Entry]))
        .unwrap();

    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 10.0, Utc::now()))
        .unwrap();
    drain(&engine, 1).await;

    let alert_id = engine.list_alerts(&AlertFilter::default())[0].alert_id;
    let acked = engine.acknowledge_alert(alert_id).unwrap();
    assert!(acked.acknowledged);

    assert!(matches!(
        engine.acknowledge_alert(alert_id),
        Err(EngineError::Conflict(_))
    ));
    assert!(matches!(
        engine.acknowledge_alert(Uuid::new_v4()),
        Err(EngineError::NotFound(_))
    ));

    // The acknowledged filter now splits the record.
    let unacked = engine.list_alerts(&AlertFilter {
        acknowledged: Some(false),
        ..Default::default()
    });
    assert!(unacked.is_empty());
}

#[tokio::test]
async fn test_out_of_order_reports_do_not_corrupt_membership() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    engine
        .upsert_zone(airport_zone(vehicle, &[AlertKind::Entry, AlertKind::Exit]))
        .unwrap();

    let t0 = Utc::now();
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 10.0, t0))
        .unwrap();
    drain(&engine, 1).await;

    // A stale report placing the vehicle outside is rejected at the
    // boundary, so no spurious exit alert appears.
    let stale = engine.ingest(position(vehicle, FAR_AWAY, 10.0, t0 - Duration::seconds(30)));
    assert!(matches!(stale, Err(EngineError::Validation(_))));

    tokio::time::sleep(StdDuration::from_millis(30)).await;
    let alerts = engine.list_alerts(&AlertFilter::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::Entry);
}

#[tokio::test]
async fn test_zone_deletion_clears_vehicle_state() {
    let engine = engine();
    let vehicle = Uuid::new_v4();
    let zone = airport_zone(vehicle, &[AlertKind::Entry, AlertKind::Exit]);
    let zone_id = zone.zone_id;
    engine.upsert_zone(zone).unwrap();

    let t0 = Utc::now();
    engine
        .ingest(position(vehicle, AIRPORT_CENTER, 10.0, t0))
        .unwrap();
    drain(&engine, 1).await;

    engine.delete_zone(zone_id).unwrap();

    // With the zone gone, movement produces no further alerts.
    engine
        .ingest(position(vehicle, FAR_AWAY, 10.0, t0 + Duration::seconds(60)))
        .unwrap();
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    assert_eq!(engine.list_alerts(&AlertFilter::default()).len(), 1);
}
