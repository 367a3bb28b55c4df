//! LLM Client Layer - Gemini integration
//!
//! This module provides:
//! - LlmClient trait for generation
//! - GeminiClient implementation
//! - MockLlmClient for tests and dry runs
//! - Gemini wire types

pub mod client;
pub mod gemini;
pub mod types;

pub use client::{LlmClient, LlmError, MockLlmClient};
pub use gemini::{DEFAULT_MODEL, GEMINI_API_BASE, GEMINI_API_KEY_ENV, GeminiClient, GeminiConfig};
pub use types::{GenerateContentRequest, GenerateContentResponse, SafetySetting};
