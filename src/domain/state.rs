//! Loop state as seen by observers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the generation loop.
///
/// Exactly one state holds at a time and only the scheduler changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoopState {
    /// Not started yet
    #[default]
    Idle,
    /// A cycle is in flight, or the last one succeeded
    Running,
    /// The last cycle failed and a retry is pending
    Recovering,
}

impl LoopState {
    /// Whether the last cycle ended healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, LoopState::Running)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoopState::Idle => "IDLE",
            LoopState::Running => "RUNNING",
            LoopState::Recovering => "RECOVERING",
        };
        write!(f, "{}", label)
    }
}
