// src/engine/state.rs

use std::fmt;

/// Lifecycle of a [`LoadCoordinator`](crate::engine::LoadCoordinator).
///
/// `Scanning`, `Dispatching` and `Draining` are only held for the duration
/// of a single core step; between steps a live session sits in `Idle` (before
/// `start`) or `WaitingOnInFlight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Scanning,
    Dispatching,
    WaitingOnInFlight,
    Draining,
    Finished,
    Failed,
}

impl CoordinatorState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CoordinatorState::Finished | CoordinatorState::Failed)
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::Scanning => "scanning",
            CoordinatorState::Dispatching => "dispatching",
            CoordinatorState::WaitingOnInFlight => "waiting-on-in-flight",
            CoordinatorState::Draining => "draining",
            CoordinatorState::Finished => "finished",
            CoordinatorState::Failed => "failed",
        };
        f.write_str(name)
    }
}
