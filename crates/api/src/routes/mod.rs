//! Route handlers.

pub mod alerts;
pub mod health;
pub mod positions;
pub mod vehicles;
pub mod zones;
