//! Gemini API client implementation
//!
//! This module implements the LlmClient trait for Google's Gemini
//! `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::llm::client::{LlmClient, LlmError};
use crate::llm::types::{
    ApiErrorEnvelope, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, SafetySetting,
};
use crate::prompt::PromptTemplate;

/// Gemini API base URL
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable holding the API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default model to use
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default max output tokens
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 4000;

/// Configuration for the Gemini client
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Threshold applied to every harm category; `None` leaves API defaults
    pub safety_threshold: Option<String>,
    /// HTTP timeout; `None` means the call may take as long as it takes
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            temperature: 1.2,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            safety_threshold: None,
            timeout: None,
        }
    }
}

impl GeminiConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: GeminiConfig,
    template: PromptTemplate,
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(
        api_key: impl Into<String>,
        config: GeminiConfig,
        template: PromptTemplate,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                env_var: GEMINI_API_KEY_ENV.to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            api_key,
            config,
            template,
        })
    }

    /// Full URL of the generateContent endpoint
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Build the request body for a context window
    fn build_request(&self, context: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user_text(self.template.render(context))],
            generation_config: GenerationConfig {
                temperature: Some(self.config.temperature),
                top_p: Some(self.config.top_p),
                top_k: Some(self.config.top_k),
                max_output_tokens: Some(self.config.max_output_tokens),
            },
            safety_settings: self
                .config
                .safety_threshold
                .as_deref()
                .map(SafetySetting::all_at),
        }
    }

    /// Send a request to the Gemini API
    async fn send_request(&self, body: &GenerateContentRequest) -> Result<GenerateContentResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        // Handle other errors
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ApiErrorEnvelope>(&error_body)
                .map(|e| e.error.message)
                .unwrap_or(error_body);
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, context: &str) -> Result<Option<String>, LlmError> {
        let body = self.build_request(context);
        let response = self.send_request(&body).await?;

        if let Some(reason) = response.block_reason() {
            log::warn!("Gemini blocked the prompt: {}", reason);
        }

        let text = response.text();
        if text.is_none() {
            log::warn!(
                "Gemini returned no usable text (finish reason: {})",
                response.finish_reason().unwrap_or("none")
            );
        }
        Ok(text)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}
