//! Alert endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::alert::{AlertResponse, ListAlertsQuery, ListAlertsResponse};
use domain::AlertFilter;

/// List alerts, newest first, with optional filters.
///
/// GET /api/v1/alerts?vehicleId=<uuid>&severity=high&acknowledged=false
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<ListAlertsQuery>,
) -> Json<ListAlertsResponse> {
    let filter: AlertFilter = query.into();
    let alerts: Vec<AlertResponse> = state
        .engine
        .list_alerts(&filter)
        .into_iter()
        .map(Into::into)
        .collect();

    let total = alerts.len();
    Json(ListAlertsResponse { alerts, total })
}

/// Acknowledge an alert.
///
/// POST /api/v1/alerts/:alert_id/acknowledge
///
/// Returns 404 for unknown alerts and 409 when the alert was already
/// acknowledged.
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> Result<Json<AlertResponse>, ApiError> {
    let alert = state.engine.acknowledge_alert(alert_id)?;

    info!(
        alert_id = %alert_id,
        vehicle_id = %alert.vehicle_id,
        kind = %alert.kind,
        "Alert acknowledged"
    );

    Ok(Json(alert.into()))
}
