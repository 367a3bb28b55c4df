//! Core LLM client types and trait definitions

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

/// Stateless generation client - each call is independent
///
/// `Ok(None)` means the upstream call succeeded but produced no usable text.
/// That is not an error: the caller substitutes its fallback content.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate the next unit of content from a context window
    async fn generate(&self, context: &str) -> Result<Option<String>, LlmError>;

    /// Model identifier, for logs
    fn model(&self) -> &str;
}

/// Errors that can occur during generation
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// The scheduler retries every failure anyway; this only picks the log level.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. } => true,
            LlmError::ApiError { status, .. } => *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::MissingApiKey { .. } => false,
        }
    }
}

type Reply = Result<Option<String>, LlmError>;

/// Scripted client for tests and dry runs.
///
/// Replies are served in order. Once the script runs out the client either
/// repeats a fixed text or fails, depending on how it was built.
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Reply>>,
    when_exhausted: Option<String>,
    contexts: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
    call_log: Option<mpsc::UnboundedSender<tokio::time::Instant>>,
}

impl MockLlmClient {
    /// Client that serves `replies` then fails every further call.
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            when_exhausted: None,
            contexts: Mutex::new(Vec::new()),
            gate: None,
            call_log: None,
        }
    }

    /// Client that always returns `text`.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self {
            when_exhausted: Some(text.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Client that serves a sequence of successful texts.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Ok(Some(t.into()))).collect())
    }

    /// Block every call until the gate is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Report the (tokio) instant of every call on a channel.
    pub fn with_call_log(mut self, tx: mpsc::UnboundedSender<tokio::time::Instant>) -> Self {
        self.call_log = Some(tx);
        self
    }

    /// Contexts received so far, in call order.
    pub fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.contexts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, context: &str) -> Result<Option<String>, LlmError> {
        self.contexts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(context.to_string());

        if let Some(tx) = &self.call_log {
            let _ = tx.send(tokio::time::Instant::now());
        }

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.replies.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(reply) => reply,
            None => match &self.when_exhausted {
                Some(text) => Ok(Some(text.clone())),
                None => Err(LlmError::InvalidResponse("mock script exhausted".to_string())),
            },
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
