//! Zone domain model.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::models::alert::AlertKind;

/// A WGS84 coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Zone geometry as a tagged variant: a circle around a center point or
/// a polygon over an ordered vertex sequence (implicitly closed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ZoneGeometry {
    #[serde(rename_all = "camelCase")]
    Circular { center: LatLng, radius_meters: f64 },
    #[serde(rename_all = "camelCase")]
    Polygonal { vertices: Vec<LatLng> },
}

/// Time restriction for a zone: an allowed minute-of-day interval
/// `[start, end)` in the zone's local clock plus a set of allowed
/// weekdays (0 = Sunday .. 6 = Saturday). An `end` before `start` spans
/// midnight. Local time is derived from a fixed UTC offset; 0 means UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRestriction {
    pub start_minute: u16,
    pub end_minute: u16,
    pub allowed_days: HashSet<u8>,
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

/// Represents an operator-defined geographic zone with access rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub zone_id: Uuid,
    pub name: String,
    pub geometry: ZoneGeometry,
    pub vehicle_ids: HashSet<Uuid>,
    pub active: bool,
    pub alert_kinds: HashSet<AlertKind>,
    pub time_restriction: Option<TimeRestriction>,
    pub speed_limit_kmh: Option<f64>,
    /// Escalates entry/exit severity to high. Defaults from the severity
    /// policy when not supplied on upsert.
    pub restricted: bool,
    pub created_at: DateTime<Utc>,
}

/// Validation failures for a zone definition, rejected at upsert time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZoneDefinitionError {
    #[error("Circular zone radius must be positive")]
    NonPositiveRadius,

    #[error("Polygonal zone requires at least 3 distinct vertices")]
    TooFewVertices,

    #[error("Coordinate out of range: ({0}, {1})")]
    CoordinateOutOfRange(String, String),

    #[error("Time restriction minutes must be below 1440")]
    InvalidTimeWindow,

    #[error("Allowed weekdays must be in 0..=6")]
    InvalidWeekday,

    #[error("Alert kind 'theft' is derived and cannot be configured")]
    TheftNotConfigurable,
}

fn check_coordinate(point: &LatLng) -> Result<(), ZoneDefinitionError> {
    if !(-90.0..=90.0).contains(&point.latitude) || !(-180.0..=180.0).contains(&point.longitude) {
        return Err(ZoneDefinitionError::CoordinateOutOfRange(
            point.latitude.to_string(),
            point.longitude.to_string(),
        ));
    }
    Ok(())
}

impl Zone {
    /// Validates the structural invariants of a zone definition.
    ///
    /// Geometry is checked here once so the evaluators can assume
    /// well-formed input.
    pub fn validate_definition(&self) -> Result<(), ZoneDefinitionError> {
        match &self.geometry {
            ZoneGeometry::Circular {
                center,
                radius_meters,
            } => {
                check_coordinate(center)?;
                if !(*radius_meters > 0.0) {
                    return Err(ZoneDefinitionError::NonPositiveRadius);
                }
            }
            ZoneGeometry::Polygonal { vertices } => {
                let mut distinct: Vec<LatLng> = Vec::with_capacity(vertices.len());
                for v in vertices {
                    check_coordinate(v)?;
                    if !distinct.contains(v) {
                        distinct.push(*v);
                    }
                }
                if distinct.len() < 3 {
                    return Err(ZoneDefinitionError::TooFewVertices);
                }
            }
        }

        if let Some(restriction) = &self.time_restriction {
            if restriction.start_minute >= 1440 || restriction.end_minute >= 1440 {
                return Err(ZoneDefinitionError::InvalidTimeWindow);
            }
            if restriction.allowed_days.iter().any(|d| *d > 6) {
                return Err(ZoneDefinitionError::InvalidWeekday);
            }
        }

        if self.alert_kinds.contains(&AlertKind::Theft) {
            return Err(ZoneDefinitionError::TheftNotConfigurable);
        }

        Ok(())
    }

    /// Whether the given alert kind is enabled for this zone.
    pub fn alerts_enabled(&self, kind: AlertKind) -> bool {
        self.alert_kinds.contains(&kind)
    }
}

/// Default alert kinds for new zones.
fn default_alert_kinds() -> Vec<AlertKind> {
    vec![AlertKind::Entry, AlertKind::Exit]
}

/// Default active status for new zones.
fn default_active() -> bool {
    true
}

/// Request payload for creating or updating a zone (PUT upsert).
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertZoneRequest {
    pub zone_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    pub geometry: ZoneGeometry,

    #[serde(default)]
    pub vehicle_ids: Vec<Uuid>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default = "default_alert_kinds")]
    pub alert_kinds: Vec<AlertKind>,

    pub time_restriction: Option<TimeRestriction>,

    #[validate(custom(function = "shared::validation::validate_speed_limit"))]
    pub speed_limit_kmh: Option<f64>,

    /// When absent, the severity policy decides the default.
    pub restricted: Option<bool>,
}

/// Response payload for zone operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneResponse {
    pub zone_id: Uuid,
    pub name: String,
    pub geometry: ZoneGeometry,
    pub vehicle_ids: Vec<Uuid>,
    pub active: bool,
    pub alert_kinds: Vec<AlertKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_restriction: Option<TimeRestriction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_limit_kmh: Option<f64>,
    pub restricted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Zone> for ZoneResponse {
    fn from(z: &Zone) -> Self {
        let mut vehicle_ids: Vec<Uuid> = z.vehicle_ids.iter().copied().collect();
        vehicle_ids.sort();
        let mut alert_kinds: Vec<AlertKind> = z.alert_kinds.iter().copied().collect();
        alert_kinds.sort();
        Self {
            zone_id: z.zone_id,
            name: z.name.clone(),
            geometry: z.geometry.clone(),
            vehicle_ids,
            active: z.active,
            alert_kinds,
            time_restriction: z.time_restriction.clone(),
            speed_limit_kmh: z.speed_limit_kmh,
            restricted: z.restricted,
            created_at: z.created_at,
        }
    }
}

/// Response for listing zones.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListZonesResponse {
    pub zones: Vec<ZoneResponse>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular_zone(radius_meters: f64) -> Zone {
        Zone {
            zone_id: Uuid::new_v4(),
            name: "Depot".to_string(),
            geometry: ZoneGeometry::Circular {
                center: LatLng::new(-26.1367, 28.2411),
                radius_meters,
            },
            vehicle_ids: HashSet::new(),
            active: true,
            alert_kinds: [AlertKind::Entry, AlertKind::Exit].into_iter().collect(),
            time_restriction: None,
            speed_limit_kmh: None,
            restricted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_circular_zone_valid() {
        assert!(circular_zone(2000.0).validate_definition().is_ok());
    }

    #[test]
    fn test_circular_zone_rejects_non_positive_radius() {
        assert_eq!(
            circular_zone(0.0).validate_definition(),
            Err(ZoneDefinitionError::NonPositiveRadius)
        );
        assert_eq!(
            circular_zone(-10.0).validate_definition(),
            Err(ZoneDefinitionError::NonPositiveRadius)
        );
    }

    #[test]
    fn test_polygonal_zone_requires_three_distinct_vertices() {
        let mut zone = circular_zone(100.0);
        zone.geometry = ZoneGeometry::Polygonal {
            vertices: vec![
                LatLng::new(-26.0, 28.0),
                LatLng::new(-26.0, 28.0),
                LatLng::new(-26.1, 28.1),
            ],
        };
        assert_eq!(
            zone.validate_definition(),
            Err(ZoneDefinitionError::TooFewVertices)
        );

        zone.geometry = ZoneGeometry::Polygonal {
            vertices: vec![
                LatLng::new(-26.0, 28.0),
                LatLng::new(-26.0, 28.1),
                LatLng::new(-26.1, 28.1),
            ],
        };
        assert!(zone.validate_definition().is_ok());
    }

    #[test]
    fn test_zone_rejects_out_of_range_coordinate() {
        let mut zone = circular_zone(100.0);
        zone.geometry = ZoneGeometry::Circular {
            center: LatLng::new(95.0, 28.0),
            radius_meters: 100.0,
        };
        assert!(matches!(
            zone.validate_definition(),
            Err(ZoneDefinitionError::CoordinateOutOfRange(_, _))
        ));
    }

    #[test]
    fn test_zone_rejects_invalid_time_restriction() {
        let mut zone = circular_zone(100.0);
        zone.time_restriction = Some(TimeRestriction {
            start_minute: 1500,
            end_minute: 100,
            allowed_days: [1, 2].into_iter().collect(),
            utc_offset_minutes: 0,
        });
        assert_eq!(
            zone.validate_definition(),
            Err(ZoneDefinitionError::InvalidTimeWindow)
        );

        zone.time_restriction = Some(TimeRestriction {
            start_minute: 480,
            end_minute: 1080,
            allowed_days: [7].into_iter().collect(),
            utc_offset_minutes: 0,
        });
        assert_eq!(
            zone.validate_definition(),
            Err(ZoneDefinitionError::InvalidWeekday)
        );
    }

    #[test]
    fn test_zone_rejects_configured_theft_kind() {
        let mut zone = circular_zone(100.0);
        zone.alert_kinds.insert(AlertKind::Theft);
        assert_eq!(
            zone.validate_definition(),
            Err(ZoneDefinitionError::TheftNotConfigurable)
        );
    }

    #[test]
    fn test_geometry_tagged_serialization() {
        let geometry = ZoneGeometry::Circular {
            center: LatLng::new(-26.1367, 28.2411),
            radius_meters: 2000.0,
        };
        let json = serde_json::to_string(&geometry).unwrap();
        assert!(json.contains("\"type\":\"circular\""));
        assert!(json.contains("\"radiusMeters\":2000"));

        let parsed: ZoneGeometry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, geometry);
    }

    #[test]
    fn test_upsert_zone_request_defaults() {
        let json = r#"{
            "zoneId": "550e8400-e29b-41d4-a716-446655440000",
            "name": "OR Tambo Airport",
            "geometry": {
                "type": "circular",
                "center": {"latitude": -26.1367, "longitude": 28.2411},
                "radiusMeters": 2000.0
            }
        }"#;

        let request: UpsertZoneRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.name, "OR Tambo Airport");
        assert!(request.active);
        assert_eq!(request.alert_kinds.len(), 2);
        assert!(request.vehicle_ids.is_empty());
        assert!(request.restricted.is_none());
    }

    #[test]
    fn test_upsert_zone_request_rejects_bad_speed_limit() {
        let json = r#"{
            "zoneId": "550e8400-e29b-41d4-a716-446655440000",
            "name": "Depot",
            "geometry": {
                "type": "circular",
                "center": {"latitude": -26.1367, "longitude": 28.2411},
                "radiusMeters": 500.0
            },
            "speedLimitKmh": -60.0
        }"#;

        let request: UpsertZoneRequest = serde_json::from_str(json).unwrap();
        assert!(request.validate().is_err());
    }
}
