//! Membership state and transition models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::zone::LatLng;

/// Containment state for one (vehicle, zone) pair. Owned exclusively by
/// the membership tracker; mutated only by that vehicle's own position
/// stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembershipState {
    pub inside: bool,
    pub evaluated_at: DateTime<Utc>,
}

/// Direction of a containment flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Entry,
    Exit,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change in containment state for a (vehicle, zone) pair between two
/// consecutive position evaluations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTransition {
    pub zone_id: Uuid,
    pub vehicle_id: Uuid,
    pub from: bool,
    pub to: bool,
    pub timestamp: DateTime<Utc>,
    pub location: LatLng,
}

impl ZoneTransition {
    pub fn kind(&self) -> TransitionKind {
        if self.to {
            TransitionKind::Entry
        } else {
            TransitionKind::Exit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_kind_from_direction() {
        let transition = ZoneTransition {
            zone_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            from: false,
            to: true,
            timestamp: Utc::now(),
            location: LatLng::new(-26.0, 28.0),
        };
        assert_eq!(transition.kind(), TransitionKind::Entry);

        let transition = ZoneTransition {
            from: true,
            to: false,
            ..transition
        };
        assert_eq!(transition.kind(), TransitionKind::Exit);
    }

    #[test]
    fn test_transition_kind_display() {
        assert_eq!(TransitionKind::Entry.to_string(), "entry");
        assert_eq!(TransitionKind::Exit.to_string(), "exit");
    }
}
