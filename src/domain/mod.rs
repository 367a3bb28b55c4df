//! Domain types for feedr
//!
//! This module contains all core domain types:
//! - ContentUnit: one generated piece of content
//! - Transcript: the append-only, never-empty log of units
//! - LoopState: Idle / Running / Recovering
//! - CycleOutcome: result of one cycle (Succeeded, Failed, Skipped)
//! - LoopEvent: what observers are told about

pub mod event;
pub mod outcome;
pub mod state;
pub mod transcript;
pub mod unit;

pub use event::{LoopEvent, event_types};
pub use outcome::CycleOutcome;
pub use state::LoopState;
pub use transcript::Transcript;
pub use unit::ContentUnit;
