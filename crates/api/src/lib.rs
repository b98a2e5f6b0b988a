//! FleetGuard HTTP API.
//!
//! Axum surface over the geofence engine: position ingestion, zone
//! management, alert listing and acknowledgement, vehicle security
//! flags, and health/metrics endpoints.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
