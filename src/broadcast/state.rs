//! Broadcaster lifecycle state

use serde::Serialize;

/// State of a broadcaster
///
/// ```text
///   Idle ◄──────► Capturing
///     │               │
///     └──► Stopped ◄──┘
/// ```
///
/// `Stopped` is terminal; a stopped broadcaster is replaced, never resumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcasterState {
    /// No listeners; the loop sleeps without capturing
    Idle,
    /// Periodic capture and fan-out
    Capturing,
    /// Shut down or failed; all listeners closed
    Stopped,
}

impl BroadcasterState {
    pub fn is_stopped(&self) -> bool {
        *self == BroadcasterState::Stopped
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: BroadcasterState) -> bool {
        !self.is_stopped() && *self != next
    }
}

impl std::fmt::Display for BroadcasterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BroadcasterState::Idle => "idle",
            BroadcasterState::Capturing => "capturing",
            BroadcasterState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use BroadcasterState::*;

        assert!(Idle.can_transition_to(Capturing));
        assert!(Capturing.can_transition_to(Idle));
        assert!(Idle.can_transition_to(Stopped));
        assert!(Capturing.can_transition_to(Stopped));
        assert!(!Stopped.can_transition_to(Idle));
        assert!(!Stopped.can_transition_to(Capturing));
        assert!(!Idle.can_transition_to(Idle));
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&BroadcasterState::Capturing).unwrap();
        assert_eq!(json, "\"capturing\"");
    }
}
