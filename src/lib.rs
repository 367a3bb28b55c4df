//! feedr - an autonomous generate-and-broadcast loop
//!
//! feedr keeps an append-only transcript, asks a generator for the next unit
//! using a bounded window of that transcript as context, and fans each new
//! unit out to Telegram and Discord. One cycle runs at a time; the loop
//! re-arms itself with a short delay after failures and a longer one after
//! successes.

pub mod broadcast;
pub mod config;
pub mod daemon;
pub mod domain;
pub mod error;
pub mod id;
pub mod llm;
pub mod prompt;
pub mod sinks;

pub use error::{FeedrError, Result};
