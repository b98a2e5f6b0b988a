//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use engine::EngineHealth;

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: EngineHealth,
}

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Full health check endpoint.
///
/// Reports engine state. A degraded engine (zone provider unreachable)
/// still answers 200 so operators can read the detail, with the status
/// field flagging the condition.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.engine.health();
    let status = if engine.degraded {
        "degraded"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine,
    })
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 503 while the engine is degraded so load balancers can
/// route position traffic elsewhere.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    if state.engine.health().degraded {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(StatusResponse {
        status: "ready".to_string(),
    }))
}
