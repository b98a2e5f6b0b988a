//! Shared utilities for the FleetGuard geofence engine.
//!
//! This crate provides common validation logic used by the domain DTOs
//! and the ingestion boundary.

pub mod validation;
