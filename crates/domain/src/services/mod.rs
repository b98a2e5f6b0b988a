//! Pure evaluation services.

pub mod geometry;
pub mod severity;
pub mod time_window;
