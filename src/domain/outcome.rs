//! Cycle outcome types.
//!
//! Every call into the scheduler's cycle ends in exactly one of these; the
//! delay policy maps them to the next re-arm delay.

use crate::broadcast::BroadcastReport;

use super::ContentUnit;

/// Outcome of one generation+broadcast cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Content was generated, appended and broadcast (sinks may have failed)
    Succeeded {
        unit: ContentUnit,
        report: BroadcastReport,
    },
    /// Generation failed before anything was appended
    Failed(String),
    /// Another cycle was already in flight; nothing happened
    Skipped,
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Succeeded { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CycleOutcome::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped)
    }

    /// The appended unit, if the cycle succeeded.
    pub fn unit(&self) -> Option<&ContentUnit> {
        match self {
            CycleOutcome::Succeeded { unit, .. } => Some(unit),
            _ => None,
        }
    }

    /// The broadcast report, if the cycle succeeded.
    pub fn report(&self) -> Option<&BroadcastReport> {
        match self {
            CycleOutcome::Succeeded { report, .. } => Some(report),
            _ => None,
        }
    }
}
