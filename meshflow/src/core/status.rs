//! Run state, stage outcome and toolchain enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state of a pipeline run.
///
/// Runs move forward through `Idle -> Validating -> RunningSfm -> RunningMvs
/// -> Finalizing -> Completed`; `Failed` is reachable from any non-terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Created, nothing done yet.
    #[default]
    Idle,
    /// Checking configuration and preparing directories.
    Validating,
    /// Running the structure-from-motion stages.
    RunningSfm,
    /// Running the multi-view-stereo stages.
    RunningMvs,
    /// Publishing the final artifacts.
    Finalizing,
    /// All stages and the handoff succeeded.
    Completed,
    /// The run aborted.
    Failed,
}

impl RunState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the run may move from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        match (self, next) {
            (state, _) if state.is_terminal() => false,
            (_, Self::Failed) => true,
            (Self::Idle, Self::Validating)
            | (Self::Validating, Self::RunningSfm)
            | (Self::RunningSfm, Self::RunningMvs)
            | (Self::RunningMvs, Self::Finalizing)
            | (Self::Finalizing, Self::Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::RunningSfm => write!(f, "running_sfm"),
            Self::RunningMvs => write!(f, "running_mvs"),
            Self::Finalizing => write!(f, "finalizing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Which sub-pipeline a stage belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Structure from motion, including the export to the MVS scene format.
    Sfm,
    /// Multi-view stereo.
    Mvs,
}

impl Phase {
    /// The run state while stages of this phase execute.
    #[must_use]
    pub fn run_state(&self) -> RunState {
        match self {
            Self::Sfm => RunState::RunningSfm,
            Self::Mvs => RunState::RunningMvs,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sfm => write!(f, "sfm"),
            Self::Mvs => write!(f, "mvs"),
        }
    }
}

/// The external toolchain a stage's binary comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toolchain {
    /// The SfM toolchain (`openMVG_main_*`).
    Sfm,
    /// The MVS toolchain (`DensifyPointCloud`, `TextureMesh`, ...).
    Mvs,
}

impl fmt::Display for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sfm => write!(f, "sfm"),
            Self::Mvs => write!(f, "mvs"),
        }
    }
}

/// How a single stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The tool exited with status 0.
    Completed,
    /// The tool failed, or its artifacts were missing.
    Failed,
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Idle.to_string(), "idle");
        assert_eq!(RunState::RunningSfm.to_string(), "running_sfm");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_run_state_forward_transitions() {
        assert!(RunState::Idle.can_transition_to(RunState::Validating));
        assert!(RunState::Validating.can_transition_to(RunState::RunningSfm));
        assert!(RunState::RunningSfm.can_transition_to(RunState::RunningMvs));
        assert!(RunState::RunningMvs.can_transition_to(RunState::Finalizing));
        assert!(RunState::Finalizing.can_transition_to(RunState::Completed));
    }

    #[test]
    fn test_run_state_rejects_skips_and_terminal_exits() {
        assert!(!RunState::Idle.can_transition_to(RunState::RunningMvs));
        assert!(!RunState::RunningSfm.can_transition_to(RunState::Finalizing));
        assert!(!RunState::Completed.can_transition_to(RunState::Failed));
        assert!(!RunState::Failed.can_transition_to(RunState::Validating));
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        for state in [
            RunState::Idle,
            RunState::Validating,
            RunState::RunningSfm,
            RunState::RunningMvs,
            RunState::Finalizing,
        ] {
            assert!(state.can_transition_to(RunState::Failed), "{state}");
        }
    }

    #[test]
    fn test_phase_run_state() {
        assert_eq!(Phase::Sfm.run_state(), RunState::RunningSfm);
        assert_eq!(Phase::Mvs.run_state(), RunState::RunningMvs);
    }

    #[test]
    fn test_run_state_serialize() {
        let json = serde_json::to_string(&RunState::RunningMvs).unwrap();
        assert_eq!(json, r#""running_mvs""#);

        let state: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, RunState::RunningMvs);
    }
}
