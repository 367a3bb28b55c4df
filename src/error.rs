//! Error types for feedr
//!
//! Centralized error handling using thiserror. Only configuration problems
//! ever stop the loop from running; every other error is classified by the
//! scheduler and retried.

use thiserror::Error;

use crate::llm::LlmError;
use crate::sinks::SinkError;

/// All error types that can occur in feedr
#[derive(Debug, Error)]
pub enum FeedrError {
    /// No usable configuration was supplied, so the loop is not started
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Upstream generation call failed
    #[error("Generation error: {0}")]
    Generation(#[from] LlmError),

    /// A delivery sink failed
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl FeedrError {
    /// Whether the error means "not started" rather than "broken".
    pub fn is_configuration_missing(&self) -> bool {
        matches!(self, FeedrError::ConfigurationMissing(_))
    }
}

/// Result type alias for feedr operations
pub type Result<T> = std::result::Result<T, FeedrError>;
