//! Daemon Core - single-flight scheduler and re-arm policy
//!
//! The daemon is the long-running part of feedr that:
//! - Runs one generate-append-broadcast cycle at a time
//! - Re-arms itself after each cycle with an outcome-dependent delay
//! - Stops cleanly when its handle is shut down or dropped

pub mod guard;
pub mod scheduler;
pub mod tick;

pub use guard::{FlightPermit, SingleFlightGuard};
pub use scheduler::{DEFAULT_FALLBACK_TEXT, LoopHandle, LoopScheduler, SchedulerConfig};
pub use tick::{CycleStats, DEFAULT_FAILURE_DELAY, DEFAULT_SUCCESS_DELAY, DelayPolicy};
