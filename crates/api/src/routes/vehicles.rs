//! Vehicle security flag endpoint handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;

/// Request payload for setting the anti-theft flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSecuredRequest {
    pub secured: bool,
}

/// Response payload for the anti-theft flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSecuredResponse {
    pub vehicle_id: Uuid,
    pub secured: bool,
}

/// Set or clear a vehicle's anti-theft flag. While set, any exit from
/// an assigned zone raises a critical theft alert.
///
/// PUT /api/v1/vehicles/:vehicle_id/secured
pub async fn set_secured(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(request): Json<SetSecuredRequest>,
) -> Json<SetSecuredResponse> {
    state.engine.set_secured(vehicle_id, request.secured);

    info!(
        vehicle_id = %vehicle_id,
        secured = request.secured,
        "Vehicle security flag updated"
    );

    Json(SetSecuredResponse {
        vehicle_id,
        secured: request.secured,
    })
}
