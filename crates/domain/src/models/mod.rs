//! Domain models.

pub mod alert;
pub mod membership;
pub mod position;
pub mod zone;
