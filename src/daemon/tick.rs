//! Tick policy - how long the driver waits before the next cycle
//!
//! Delays are fixed: one for after a success, a shorter one for after a
//! failure. There is no backoff and no retry limit.

use std::time::Duration;

use serde::Serialize;

use crate::domain::CycleOutcome;

/// Default delay after a successful cycle
pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_secs(8);

/// Default delay after a failed cycle
pub const DEFAULT_FAILURE_DELAY: Duration = Duration::from_secs(3);

/// Maps a cycle outcome to the next re-arm delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    pub success_delay: Duration,
    pub failure_delay: Duration,
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            success_delay: DEFAULT_SUCCESS_DELAY,
            failure_delay: DEFAULT_FAILURE_DELAY,
        }
    }
}

impl DelayPolicy {
    pub fn new(success_delay: Duration, failure_delay: Duration) -> Self {
        Self {
            success_delay,
            failure_delay,
        }
    }

    /// Delay before the next cycle.
    ///
    /// A skipped cycle means another one is in flight; that cycle's owner
    /// re-arms for itself, so the skipper waits the normal cadence.
    pub fn next_delay(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Succeeded { .. } | CycleOutcome::Skipped => self.success_delay,
            CycleOutcome::Failed(_) => self.failure_delay,
        }
    }
}

/// Running counters kept by the scheduler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    /// Cycles that acquired the guard
    pub cycles: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Attempts that found a cycle already in flight
    pub skipped: u64,
    /// Failures since the last success
    pub consecutive_failures: u64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one `run_cycle` call
    pub fn record(&mut self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Succeeded { .. } => {
                self.cycles += 1;
                self.succeeded += 1;
                self.consecutive_failures = 0;
            }
            CycleOutcome::Failed(_) => {
                self.cycles += 1;
                self.failed += 1;
                self.consecutive_failures += 1;
            }
            CycleOutcome::Skipped => self.skipped += 1,
        }
    }
}
