//! FleetGuard geofence evaluation engine.
//!
//! The stateful concurrent core: a zone registry with atomic snapshot
//! reads, a per-vehicle membership tracker, the alert generator with
//! deduplication, the alert lifecycle store, and the ingestion
//! dispatcher that serializes processing per vehicle while keeping
//! unrelated vehicles parallel.

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod generator;
pub mod notifier;
pub mod registry;
pub mod store;
pub mod tracker;

pub use engine::{EngineConfig, EngineHealth, GeofenceEngine};
pub use error::EngineError;
pub use notifier::{
    AlertNotification, DispatchResult, LogNotifier, NotificationDispatcher, WebhookNotifier,
};
pub use registry::{ZoneProvider, ZoneRegistry};
