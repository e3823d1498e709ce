//! Build state machine
//!
//! IDLE → CHAIN_RESOLVED → MERGED → PROFILES_ACTIVATED → INTERPOLATED → DONE,
//! or FAILED from any non-terminal state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Build state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildState {
    /// Nothing done yet
    Idle,
    /// Parent chain resolved
    ChainResolved,
    /// Chain folded into one tree
    Merged,
    /// Active profiles selected and injected
    ProfilesActivated,
    /// Placeholders resolved
    Interpolated,
    /// Effective model produced
    Done,
    /// Invocation aborted
    Failed,
}

impl BuildState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }

    /// Check if transition from this state to target is valid
    pub fn can_transition_to(&self, target: BuildState) -> bool {
        match (self, target) {
            (BuildState::Idle, BuildState::ChainResolved) => true,
            (BuildState::ChainResolved, BuildState::Merged) => true,
            (BuildState::Merged, BuildState::ProfilesActivated) => true,
            (BuildState::ProfilesActivated, BuildState::Interpolated) => true,
            (BuildState::Interpolated, BuildState::Done) => true,

            // Any non-terminal state can fail
            (from, BuildState::Failed) => !from.is_terminal(),

            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildState::Idle => "IDLE",
            BuildState::ChainResolved => "CHAIN_RESOLVED",
            BuildState::Merged => "MERGED",
            BuildState::ProfilesActivated => "PROFILES_ACTIVATED",
            BuildState::Interpolated => "INTERPOLATED",
            BuildState::Done => "DONE",
            BuildState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for build state operations
#[derive(Debug, thiserror::Error)]
pub enum BuildStateError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: BuildState, to: BuildState },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            BuildState::Idle,
            BuildState::ChainResolved,
            BuildState::Merged,
            BuildState::ProfilesActivated,
            BuildState::Interpolated,
            BuildState::Done,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_stages() {
        assert!(!BuildState::Idle.can_transition_to(BuildState::Merged));
        assert!(!BuildState::ChainResolved.can_transition_to(BuildState::Interpolated));
        assert!(!BuildState::Merged.can_transition_to(BuildState::ChainResolved));
    }

    #[test]
    fn test_fail_from_non_terminal() {
        assert!(BuildState::Idle.can_transition_to(BuildState::Failed));
        assert!(BuildState::Interpolated.can_transition_to(BuildState::Failed));
        assert!(!BuildState::Done.can_transition_to(BuildState::Failed));
        assert!(!BuildState::Failed.can_transition_to(BuildState::Failed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BuildState::Done.is_terminal());
        assert!(BuildState::Failed.is_terminal());
        assert!(!BuildState::Merged.is_terminal());
        assert!(!BuildState::Done.can_transition_to(BuildState::Idle));
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&BuildState::ProfilesActivated).unwrap();
        assert_eq!(json, "\"PROFILES_ACTIVATED\"");
    }
}
