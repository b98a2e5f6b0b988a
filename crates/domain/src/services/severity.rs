//! Severity classification policy.
//!
//! The mapping from alert kind and zone attributes to severity is an
//! explicit, configurable policy rather than an inference scattered
//! through the pipeline.

use std::collections::HashSet;

use serde::Deserialize;
use uuid::Uuid;

use crate::models::alert::{AlertKind, Severity};
use crate::models::zone::{Zone, ZoneGeometry};

/// Configurable severity policy.
#[derive(Debug, Clone, Deserialize)]
pub struct SeverityPolicy {
    /// Speed overage ratio at or below which a speed alert stays low
    /// severity (0.2 = 20% over the limit).
    #[serde(default = "default_speed_overage_threshold")]
    pub speed_overage_threshold: f64,

    /// Whether polygonal zones with no assigned vehicles default to
    /// restricted when the upsert does not say otherwise.
    #[serde(default = "default_restrict_unassigned_polygons")]
    pub restrict_unassigned_polygons: bool,
}

fn default_speed_overage_threshold() -> f64 {
    0.20
}

fn default_restrict_unassigned_polygons() -> bool {
    true
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            speed_overage_threshold: default_speed_overage_threshold(),
            restrict_unassigned_polygons: default_restrict_unassigned_polygons(),
        }
    }
}

impl SeverityPolicy {
    /// Deterministic severity for an alert of the given kind against the
    /// given zone. `overage_ratio` is only meaningful for speed alerts
    /// (actual speed over the limit, minus one).
    pub fn classify(&self, kind: AlertKind, zone: &Zone, overage_ratio: Option<f64>) -> Severity {
        match kind {
            AlertKind::Entry | AlertKind::Exit => {
                if zone.restricted {
                    Severity::High
                } else {
                    Severity::Medium
                }
            }
            AlertKind::Speed => {
                let overage = overage_ratio.unwrap_or(0.0);
                if overage <= self.speed_overage_threshold {
                    Severity::Low
                } else {
                    Severity::Medium
                }
            }
            AlertKind::Time => Severity::Medium,
            AlertKind::Theft => Severity::Critical,
        }
    }

    /// Default restricted flag for a zone whose upsert left it
    /// unspecified.
    pub fn default_restricted(&self, geometry: &ZoneGeometry, vehicle_ids: &HashSet<Uuid>) -> bool {
        self.restrict_unassigned_polygons
            && matches!(geometry, ZoneGeometry::Polygonal { .. })
            && vehicle_ids.is_empty()
    }
}
