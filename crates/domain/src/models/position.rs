//! Vehicle position domain model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::zone::LatLng;

/// A single telemetry report from a vehicle. Ephemeral: the engine keeps
/// only what the membership tracker needs for its current-state
/// comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    pub vehicle_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub timestamp: DateTime<Utc>,
}

impl VehiclePosition {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Request payload for ingesting a position report.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestPositionRequest {
    pub vehicle_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed_kmh: f64,

    /// Timestamp in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,
}

impl IngestPositionRequest {
    /// Converts the request into a domain position. Returns `None` when
    /// the millisecond timestamp does not map to a valid instant.
    pub fn into_position(self) -> Option<VehiclePosition> {
        let timestamp = Utc.timestamp_millis_opt(self.timestamp).single()?;
        Some(VehiclePosition {
            vehicle_id: self.vehicle_id,
            latitude: self.latitude,
            longitude: self.longitude,
            speed_kmh: self.speed_kmh,
            timestamp,
        })
    }
}

/// Response for an accepted position report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestPositionResponse {
    pub accepted: bool,
    pub vehicle_id: Uuid,
}
