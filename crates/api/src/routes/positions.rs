//! Position ingestion endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::position::{IngestPositionRequest, IngestPositionResponse};

/// Accept a vehicle position report for asynchronous evaluation.
///
/// POST /api/v1/positions
///
/// Returns 202 Accepted: evaluation happens on the vehicle's worker,
/// not on the request path. Out-of-order reports are rejected here
/// with 400.
pub async fn ingest_position(
    State(state): State<AppState>,
    Json(request): Json<IngestPositionRequest>,
) -> Result<(StatusCode, Json<IngestPositionResponse>), ApiError> {
    request.validate()?;

    let position = request
        .into_position()
        .ok_or_else(|| ApiError::Validation("Timestamp is out of representable range".into()))?;
    let vehicle_id = position.vehicle_id;

    state.engine.ingest(position)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(IngestPositionResponse {
            accepted: true,
            vehicle_id,
        }),
    ))
}
