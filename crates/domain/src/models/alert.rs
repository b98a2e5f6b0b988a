//! Alert domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::zone::LatLng;

/// Seconds per deterministic alert-id bucket. Retried processing of the
/// same report lands in the same bucket and therefore the same alert id.
pub const ALERT_ID_BUCKET_SECS: i64 = 60;

/// Kinds of alert the engine can emit. `theft` is derived by the engine
/// and never user-configured on a zone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Entry,
    Exit,
    Speed,
    Time,
    Theft,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Speed => "speed",
            Self::Time => "time",
            Self::Theft => "theft",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "entry" => Some(Self::Entry),
            "exit" => Some(Self::Exit),
            "speed" => Some(Self::Speed),
            "time" => Some(Self::Time),
            "theft" => Some(Self::Theft),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert severity classification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable historical alert record. Only the acknowledged flag ever
/// changes, false to true, exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: Uuid,
    pub zone_id: Uuid,
    pub vehicle_id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub location: LatLng,
    pub description: String,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Deterministic alert id from vehicle, zone, kind and a coarse
    /// timestamp bucket. Guards the lifecycle store against duplicate
    /// emission from retried processing.
    pub fn deterministic_id(
        vehicle_id: Uuid,
        zone_id: Uuid,
        kind: AlertKind,
        timestamp: DateTime<Utc>,
    ) -> Uuid {
        let bucket = timestamp.timestamp().div_euclid(ALERT_ID_BUCKET_SECS);
        let name = format!("fleetguard:{vehicle_id}:{zone_id}:{}:{bucket}", kind.as_str());
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    }
}

/// Filter for alert listing.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub vehicle_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub severity: Option<Severity>,
    pub acknowledged: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl AlertFilter {
    /// Whether the given alert passes this filter.
    pub fn matches(&self, alert: &Alert) -> bool {
        if self.vehicle_id.is_some_and(|v| v != alert.vehicle_id) {
            return false;
        }
        if self.zone_id.is_some_and(|z| z != alert.zone_id) {
            return false;
        }
        if self.severity.is_some_and(|s| s != alert.severity) {
            return false;
        }
        if self.acknowledged.is_some_and(|a| a != alert.acknowledged) {
            return false;
        }
        if self.from.is_some_and(|f| alert.timestamp < f) {
            return false;
        }
        if self.to.is_some_and(|t| alert.timestamp > t) {
            return false;
        }
        true
    }
}

fn default_limit() -> usize {
    50
}

/// Query parameters for listing alerts.
/// GET /api/v1/alerts?vehicleId=<uuid>&severity=high&acknowledged=false
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsQuery {
    pub vehicle_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub severity: Option<Severity>,
    pub acknowledged: Option<bool>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl From<ListAlertsQuery> for AlertFilter {
    fn from(q: ListAlertsQuery) -> Self {
        Self {
            vehicle_id: q.vehicle_id,
            zone_id: q.zone_id,
            severity: q.severity,
            acknowledged: q.acknowledged,
            from: q.from,
            to: q.to,
            limit: q.limit,
        }
    }
}

/// Response payload for a single alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub alert_id: Uuid,
    pub zone_id: Uuid,
    pub vehicle_id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub location: LatLng,
    pub description: String,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl From<Alert> for AlertResponse {
    fn from(a: Alert) -> Self {
        Self {
            alert_id: a.alert_id,
            zone_id: a.zone_id,
            vehicle_id: a.vehicle_id,
            kind: a.kind,
            severity: a.severity,
            timestamp: a.timestamp,
            location: a.location,
            description: a.description,
            acknowledged: a.acknowledged,
            acknowledged_at: a.acknowledged_at,
        }
    }
}

/// Response for listing alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAlertsResponse {
    pub alerts: Vec<AlertResponse>,
    pub total: usize,
}
