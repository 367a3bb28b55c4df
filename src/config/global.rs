//! Global configuration.
//!
//! Loaded from ~/.config/feedr/feedr.yml or .feedr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::broadcast::BroadcastConfig;
use crate::daemon::{DEFAULT_FALLBACK_TEXT, DelayPolicy, SchedulerConfig};
use crate::llm::gemini::DEFAULT_MAX_OUTPUT_TOKENS;
use crate::llm::{DEFAULT_MODEL, GEMINI_API_BASE, GEMINI_API_KEY_ENV, GeminiConfig};
use crate::prompt::{DEFAULT_CONTEXT_BUDGET, DEFAULT_DIRECTIVE, DEFAULT_SEED, DEFAULT_SYSTEM_PROMPT, PromptTemplate};
use crate::sinks::{SinkDescriptor, SinkSettings, TELEGRAM_API_BASE};

/// Global configuration for feedr.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Generation backend settings.
    pub generation: LlmConfig,

    /// Cycle cadence and context size.
    #[serde(rename = "loop")]
    pub cadence: LoopSettings,

    /// Prompt framing and seed.
    pub prompt: PromptConfig,

    /// Persisted sink credentials.
    pub broadcast: BroadcastSection,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .feedr.yml in current directory
    /// 3. ~/.config/feedr/feedr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project config
        let project_config = PathBuf::from(".feedr.yml");
        if project_config.exists() {
            match Self::load_from_file(&project_config) {
                Ok(config) => {
                    log::info!("Loaded config from .feedr.yml");
                    return Ok(config);
                }
                Err(e) => {
                    log::warn!("Failed to load .feedr.yml: {}", e);
                }
            }
        }

        // Try user config
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("feedr").join("feedr.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", user_config.display());
                        return Ok(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.cadence.context_budget == 0 {
            eyre::bail!("loop.context-budget must be > 0");
        }
        if self.cadence.success_delay_ms == 0 {
            eyre::bail!("loop.success-delay-ms must be > 0");
        }
        if self.cadence.failure_delay_ms == 0 {
            eyre::bail!("loop.failure-delay-ms must be > 0");
        }
        if self.broadcast.timeout_ms == 0 {
            eyre::bail!("broadcast.timeout-ms must be > 0");
        }
        if self.generation.max_output_tokens == 0 {
            eyre::bail!("generation.max-output-tokens must be > 0");
        }
        if self.generation.timeout_ms == Some(0) {
            eyre::bail!("generation.timeout-ms must be > 0 when set");
        }
        Ok(())
    }

    /// Client settings for the Gemini backend.
    pub fn gemini_config(&self) -> GeminiConfig {
        let g = &self.generation;
        GeminiConfig {
            model: g.model.clone(),
            base_url: g.base_url.clone(),
            temperature: g.temperature,
            top_p: g.top_p,
            top_k: g.top_k,
            max_output_tokens: g.max_output_tokens,
            safety_threshold: g.safety_threshold.clone(),
            timeout: g.timeout_ms.map(Duration::from_millis),
        }
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(GEMINI_API_KEY_ENV)
            .or_else(|| self.generation.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        DelayPolicy::new(
            Duration::from_millis(self.cadence.success_delay_ms),
            Duration::from_millis(self.cadence.failure_delay_ms),
        )
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            delay_policy: self.delay_policy(),
            context_budget: self.cadence.context_budget,
            fallback_text: self.generation.fallback_text.clone(),
            seed: self.prompt.seed.clone(),
        }
    }

    pub fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(&self.prompt.system, &self.prompt.directive)
    }

    pub fn sink_settings(&self) -> SinkSettings {
        SinkSettings {
            timeout: Duration::from_millis(self.broadcast.timeout_ms),
            telegram_api_base: self.broadcast.telegram_api_base.clone(),
        }
    }

    /// Sink credentials persisted in the config file.
    pub fn stored_broadcast(&self) -> BroadcastConfig {
        let mut config = BroadcastConfig::default();
        if let Some(tg) = &self.broadcast.telegram {
            config = config.with(SinkDescriptor::telegram(&tg.bot_token, &tg.chat_id));
        }
        if let Some(dc) = &self.broadcast.discord {
            config = config.with(SinkDescriptor::discord(&dc.webhook_url));
        }
        config
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,

    /// API key; the GEMINI_API_KEY environment variable wins when set.
    #[serde(rename = "api-key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(rename = "base-url")]
    pub base_url: String,

    pub temperature: f64,

    #[serde(rename = "top-p")]
    pub top_p: f64,

    #[serde(rename = "top-k")]
    pub top_k: u32,

    #[serde(rename = "max-output-tokens")]
    pub max_output_tokens: u32,

    /// HTTP timeout per generation call in milliseconds; unset means none.
    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Threshold applied to every harm category, e.g. BLOCK_ONLY_HIGH.
    #[serde(rename = "safety-threshold", skip_serializing_if = "Option::is_none")]
    pub safety_threshold: Option<String>,

    /// Content broadcast when the backend returns nothing usable.
    #[serde(rename = "fallback-text")]
    pub fallback_text: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            base_url: GEMINI_API_BASE.to_string(),
            temperature: 1.2,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_ms: None,
            safety_threshold: None,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }
}

/// Cycle cadence and context size.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoopSettings {
    /// Delay after a successful cycle in milliseconds.
    #[serde(rename = "success-delay-ms")]
    pub success_delay_ms: u64,

    /// Delay after a failed cycle in milliseconds.
    #[serde(rename = "failure-delay-ms")]
    pub failure_delay_ms: u64,

    /// Characters of history sent with each request.
    #[serde(rename = "context-budget")]
    pub context_budget: usize,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            success_delay_ms: 8_000,
            failure_delay_ms: 3_000,
            context_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }
}

/// Prompt framing and seed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system: String,
    pub directive: String,
    pub seed: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            directive: DEFAULT_DIRECTIVE.to_string(),
            seed: DEFAULT_SEED.to_string(),
        }
    }
}

/// Persisted sink credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramCredentials>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discord: Option<DiscordCredentials>,

    /// Hard timeout per sink call in milliseconds.
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    #[serde(rename = "telegram-api-base")]
    pub telegram_api_base: String,
}

impl Default for BroadcastSection {
    fn default() -> Self {
        Self {
            telegram: None,
            discord: None,
            timeout_ms: 10_000,
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramCredentials {
    #[serde(rename = "bot-token")]
    pub bot_token: String,

    #[serde(rename = "chat-id")]
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscordCredentials {
    #[serde(rename = "webhook-url")]
    pub webhook_url: String,
}
