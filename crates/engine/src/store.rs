//! Alert lifecycle store.
//!
//! In-memory store for emitted alerts. Records are immutable apart from
//! the acknowledged flag, which moves false to true exactly once.
//! Inserts are idempotent by alert id so retried processing of the same
//! report never produces duplicates.

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use domain::{Alert, AlertFilter};

use crate::error::EngineError;

#[derive(Default)]
pub struct AlertStore {
    alerts: DashMap<Uuid, Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an alert unless one with the same id already exists.
    /// Returns true when the alert was newly recorded.
    pub fn insert(&self, alert: Alert) -> bool {
        match self.alerts.entry(alert.alert_id) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(alert);
                true
            }
        }
    }

    pub fn get(&self, alert_id: Uuid) -> Option<Alert> {
        self.alerts.get(&alert_id).map(|a| a.clone())
    }

    /// Alerts matching the filter, newest first, capped at the filter's
    /// limit.
    pub fn list(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut matched: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| filter.matches(a))
            .map(|a| a.clone())
            .collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if filter.limit > 0 {
            matched.truncate(filter.limit);
        }
        matched
    }

    /// Marks an alert acknowledged. Fails with `NotFound` for unknown
    /// ids and `Conflict` when already acknowledged; the stored record
    /// is never reverted.
    pub fn acknowledge(&self, alert_id: Uuid) -> Result<Alert, EngineError> {
        let mut alert = self
            .alerts
            .get_mut(&alert_id)
            .ok_or_else(|| EngineError::NotFound(format!("Alert {alert_id} not found")))?;

        if alert.acknowledged {
            return Err(EngineError::Conflict(format!(
                "Alert {alert_id} is already acknowledged"
            )));
        }

        alert.acknowledged = true;
        alert.acknowledged_at = Some(Utc::now());
        Ok(alert.clone())
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
