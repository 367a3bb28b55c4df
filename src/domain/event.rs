//! Loop events for observers.
//!
//! The scheduler publishes these on a broadcast channel. Presentation layers
//! subscribe to render the growing transcript; a slow or absent subscriber
//! never blocks the loop.

use crate::broadcast::BroadcastReport;

use super::{ContentUnit, LoopState};

/// Event type constants
pub mod event_types {
    pub const CYCLE_STARTED: &str = "cycle.started";
    pub const UNIT_APPENDED: &str = "unit.appended";
    pub const BROADCASTED: &str = "cycle.broadcasted";
    pub const CYCLE_FAILED: &str = "cycle.failed";
    pub const STATE_CHANGED: &str = "loop.state_changed";
}

/// Something observable that happened inside the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    /// A cycle acquired the guard
    CycleStarted { cycle: u64 },
    /// A new unit was appended to the transcript
    UnitAppended(ContentUnit),
    /// The broadcast for the current cycle settled
    Broadcasted(BroadcastReport),
    /// A cycle failed and the loop is recovering
    CycleFailed { cycle: u64, error: String },
    /// The loop state changed
    StateChanged(LoopState),
}

impl LoopEvent {
    /// Dotted event type name, for logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            LoopEvent::CycleStarted { .. } => event_types::CYCLE_STARTED,
            LoopEvent::UnitAppended(_) => event_types::UNIT_APPENDED,
            LoopEvent::Broadcasted(_) => event_types::BROADCASTED,
            LoopEvent::CycleFailed { .. } => event_types::CYCLE_FAILED,
            LoopEvent::StateChanged(_) => event_types::STATE_CHANGED,
        }
    }
}
