//! Sink Adapters - delivery channels for generated content
//!
//! Each adapter owns its credentials, enforces its channel's payload limit
//! and bounds every call with a hard timeout. Adapters fail independently;
//! the dispatcher never lets one adapter's failure reach another.

pub mod discord;
pub mod telegram;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::id::mask_secret;

pub use discord::{DISCORD_CONTENT_LIMIT, DiscordSink};
pub use telegram::{TELEGRAM_API_BASE, TELEGRAM_TEXT_LIMIT, TelegramSink};

/// Appended to payloads cut down to fit a channel limit.
pub const TRUNCATION_MARKER: &str = "... [SIGNAL_TRUNCATED]";

/// Default hard timeout for one sink call.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors a single sink can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("sink is missing credentials")]
    Disabled,
}

/// A delivery channel.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short channel name, for logs and reports
    fn name(&self) -> &str;

    /// Whether every required credential is present
    fn is_enabled(&self) -> bool;

    /// Deliver one unit of content
    async fn send(&self, text: &str) -> Result<(), SinkError>;
}

/// Shared knobs for building adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSettings {
    /// Hard timeout per call
    pub timeout: Duration,
    /// Telegram Bot API base URL
    pub telegram_api_base: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SINK_TIMEOUT,
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}

/// Credentials and endpoint for one sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkDescriptor {
    Telegram { bot_token: String, chat_id: String },
    Discord { webhook_url: String },
}

impl SinkDescriptor {
    pub fn telegram(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        SinkDescriptor::Telegram {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn discord(webhook_url: impl Into<String>) -> Self {
        SinkDescriptor::Discord {
            webhook_url: webhook_url.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SinkDescriptor::Telegram { .. } => "telegram",
            SinkDescriptor::Discord { .. } => "discord",
        }
    }

    /// A sink is enabled only when all of its credentials are non-empty.
    pub fn is_enabled(&self) -> bool {
        match self {
            SinkDescriptor::Telegram { bot_token, chat_id } => {
                !bot_token.trim().is_empty() && !chat_id.trim().is_empty()
            }
            SinkDescriptor::Discord { webhook_url } => !webhook_url.trim().is_empty(),
        }
    }

    /// Human-readable description with secrets masked.
    pub fn describe(&self) -> String {
        match self {
            SinkDescriptor::Telegram { bot_token, chat_id } => {
                format!("telegram (token {}, chat {})", mask_secret(bot_token), chat_id)
            }
            SinkDescriptor::Discord { webhook_url } => format!("discord (webhook {})", mask_secret(webhook_url)),
        }
    }

    /// Build the adapter for this descriptor.
    pub fn build(&self, client: &Client, settings: &SinkSettings) -> Arc<dyn Sink> {
        match self {
            SinkDescriptor::Telegram { bot_token, chat_id } => Arc::new(
                TelegramSink::new(client.clone(), bot_token.trim(), chat_id.trim())
                    .with_api_base(&settings.telegram_api_base)
                    .with_timeout(settings.timeout),
            ),
            SinkDescriptor::Discord { webhook_url } => {
                Arc::new(DiscordSink::new(client.clone(), webhook_url.trim()).with_timeout(settings.timeout))
            }
        }
    }
}

/// Cut `text` down to at most `limit` characters.
///
/// Oversized text keeps its first `limit - len(TRUNCATION_MARKER)` characters
/// followed by the marker, so the result never exceeds `limit`.
pub fn truncate_payload(text: &str, limit: usize) -> Cow<'_, str> {
    if text.chars().count() <= limit {
        return Cow::Borrowed(text);
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(TRUNCATION_MARKER);
    Cow::Owned(out)
}

/// POST a JSON body with a hard timeout.
///
/// Non-2xx responses are logged with their body and reported as `Rejected`.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    body: &serde_json::Value,
    timeout: Duration,
    sink: &str,
) -> Result<(), SinkError> {
    let request = async {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            // URLs carry credentials (bot token, webhook secret)
            .map_err(|e| SinkError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("{} API error {}: {}", sink, status, body);
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    };

    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(SinkError::Timeout(timeout)),
    }
}
