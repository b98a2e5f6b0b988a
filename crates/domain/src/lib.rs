//! Domain models and pure evaluation services for the FleetGuard
//! geofence engine.
//!
//! Everything in this crate is synchronous and side-effect free: the
//! geometry and time-window evaluators, the severity policy, and the
//! data model shared between the engine and the API surface.

pub mod models;
pub mod services;

pub use models::alert::{Alert, AlertFilter, AlertKind, Severity};
pub use models::membership::{MembershipState, TransitionKind, ZoneTransition};
pub use models::position::VehiclePosition;
pub use models::zone::{LatLng, TimeRestriction, Zone, ZoneGeometry};
