//! Prompt System - context compression and prompt framing
//!
//! This module turns the ever-growing transcript into the bounded prompt the
//! generator receives:
//! - ContextCompressor keeps the trailing window of the transcript
//! - PromptTemplate wraps that window with standing instructions

mod compressor;
mod render;

pub use compressor::{ContextCompressor, DEFAULT_CONTEXT_BUDGET, UNIT_SEPARATOR, tail_chars};
pub use render::{DEFAULT_DIRECTIVE, DEFAULT_SEED, DEFAULT_SYSTEM_PROMPT, PromptTemplate};
