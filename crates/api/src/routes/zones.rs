//! Zone management endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::zone::{ListZonesResponse, UpsertZoneRequest, ZoneResponse};
use domain::Zone;

/// Create or replace a zone definition.
///
/// PUT /api/v1/zones
///
/// Returns 201 when the zone is new, 200 when it replaced an existing
/// definition. The whole definition is validated before any state
/// changes; a rejected upsert leaves the previous definition in place.
pub async fn upsert_zone(
    State(state): State<AppState>,
    Json(request): Json<UpsertZoneRequest>,
) -> Result<(StatusCode, Json<ZoneResponse>), ApiError> {
    request.validate()?;

    let vehicle_ids: std::collections::HashSet<Uuid> =
        request.vehicle_ids.iter().copied().collect();
    let restricted = request.restricted.unwrap_or_else(|| {
        state
            .engine
            .severity_policy()
            .default_restricted(&request.geometry, &vehicle_ids)
    });
    // Replacing a zone keeps its original creation time.
    let created_at = state
        .engine
        .get_zone(request.zone_id)
        .map(|existing| existing.created_at)
        .unwrap_or_else(|_| Utc::now());

    let zone = Zone {
        zone_id: request.zone_id,
        name: request.name,
        geometry: request.geometry,
        vehicle_ids,
        active: request.active,
        alert_kinds: request.alert_kinds.into_iter().collect(),
        time_restriction: request.time_restriction,
        speed_limit_kmh: request.speed_limit_kmh,
        restricted,
        created_at,
    };
    let zone_id = zone.zone_id;

    let created = state.engine.upsert_zone(zone)?;
    let stored = state.engine.get_zone(zone_id)?;

    info!(
        zone_id = %zone_id,
        name = %stored.name,
        created = created,
        "Zone upserted"
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ZoneResponse::from(stored.as_ref()))))
}

/// List all zones.
///
/// GET /api/v1/zones
pub async fn list_zones(State(state): State<AppState>) -> Json<ListZonesResponse> {
    let mut zones: Vec<ZoneResponse> = state
        .engine
        .list_zones()
        .iter()
        .map(|z| ZoneResponse::from(z.as_ref()))
        .collect();
    zones.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.zone_id.cmp(&b.zone_id)));

    let total = zones.len();
    Json(ListZonesResponse { zones, total })
}

/// Get a single zone by ID.
///
/// GET /api/v1/zones/:zone_id
pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<ZoneResponse>, ApiError> {
    let zone = state.engine.get_zone(zone_id)?;
    Ok(Json(ZoneResponse::from(zone.as_ref())))
}

/// Delete a zone and all membership state tied to it.
///
/// DELETE /api/v1/zones/:zone_id
pub async fn delete_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.engine.delete_zone(zone_id)?;
    info!(zone_id = %zone_id, "Zone deleted");
    Ok(StatusCode::NO_CONTENT)
}
