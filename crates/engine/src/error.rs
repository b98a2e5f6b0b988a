//! Engine error types.

use thiserror::Error;

/// Typed failures surfaced by engine operations. None of these are
/// fatal to the engine itself: a bad position or an unavailable
/// dependency affects only the vehicles and zones involved.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed input, rejected at the boundary and never partially
    /// applied.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown zone, vehicle, or alert on lookup or acknowledge.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Acknowledging an already-acknowledged alert.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Zone registry or another dependency temporarily unreachable;
    /// evaluation for the affected vehicle is skipped and retried on
    /// its next position report.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            EngineError::Validation("bad speed".to_string()).to_string(),
            "Validation error: bad speed"
        );
        assert_eq!(
            EngineError::NotFound("zone".to_string()).to_string(),
            "Not found: zone"
        );
        assert_eq!(
            EngineError::Conflict("already acknowledged".to_string()).to_string(),
            "Conflict: already acknowledged"
        );
        assert_eq!(
            EngineError::DependencyUnavailable("registry".to_string()).to_string(),
            "Dependency unavailable: registry"
        );
    }
}
