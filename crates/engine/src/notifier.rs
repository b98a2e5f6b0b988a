//! Alert notification dispatch.
//!
//! Abstraction for pushing newly generated alerts to external sinks.
//! Delivery is best-effort and never blocks or fails position
//! processing; a failed dispatch is logged and the alert remains in the
//! store regardless.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use domain::{Alert, AlertKind, Severity};

/// Outbound alert payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNotification {
    pub alert_id: Uuid,
    pub zone_id: Uuid,
    pub vehicle_id: Uuid,
    pub kind: AlertKind,
    pub severity: Severity,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub description: String,
}

impl From<&Alert> for AlertNotification {
    fn from(alert: &Alert) -> Self {
        Self {
            alert_id: alert.alert_id,
            zone_id: alert.zone_id,
            vehicle_id: alert.vehicle_id,
            kind: alert.kind,
            severity: alert.severity,
            timestamp: alert.timestamp,
            description: alert.description.clone(),
        }
    }
}

/// Result of a dispatch attempt.
#[derive(Debug, Clone)]
pub enum DispatchResult {
    /// Alert was delivered to the sink.
    Delivered,
    /// Delivery failed; the alert is still stored.
    Failed(String),
}

/// Sink for generated alerts.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: AlertNotification) -> DispatchResult;
}

/// Dispatcher that logs alerts instead of delivering them. Used in
/// development and as the default when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    /// Whether to simulate delivery failures for testing.
    pub simulate_failure: bool,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn dispatch(&self, notification: AlertNotification) -> DispatchResult {
        if self.simulate_failure {
            tracing::warn!(
                alert_id = %notification.alert_id,
                vehicle_id = %notification.vehicle_id,
                "Log notifier simulating delivery failure"
            );
            return DispatchResult::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            alert_id = %notification.alert_id,
            zone_id = %notification.zone_id,
            vehicle_id = %notification.vehicle_id,
            kind = %notification.kind,
            severity = %notification.severity,
            "Alert generated: {}",
            notification.description
        );

        DispatchResult::Delivered
    }
}

/// Dispatcher that POSTs alerts as JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, url }
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for WebhookNotifier {
    async fn dispatch(&self, notification: AlertNotification) -> DispatchResult {
        let response = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => DispatchResult::Delivered,
            Ok(resp) => {
                tracing::warn!(
                    alert_id = %notification.alert_id,
                    status = %resp.status(),
                    "Webhook returned non-success status"
                );
                DispatchResult::Failed(format!("HTTP {}", resp.status()))
            }
            Err(e) => {
                tracing::warn!(
                    alert_id = %notification.alert_id,
                    error = %e,
                    "Webhook delivery failed"
                );
                DispatchResult::Failed(e.to_string())
            }
        }
    }
}
