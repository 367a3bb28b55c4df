//! Discord webhook sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DEFAULT_SINK_TIMEOUT, Sink, SinkError, post_json, truncate_payload};

/// Max characters of content per message (Discord caps `content` at 2000)
pub const DISCORD_CONTENT_LIMIT: usize = 1900;

/// Discord webhook sink.
pub struct DiscordSink {
    client: Client,
    webhook_url: String,
    timeout: Duration,
}

impl DiscordSink {
    pub fn new(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wrap content in the channel's message layout.
    pub fn format_message(text: &str) -> String {
        format!(
            "**🩸 LIVE INCIDENT REPORT**\n>>> {}\n\n*System: Autonomous*",
            truncate_payload(text, DISCORD_CONTENT_LIMIT)
        )
    }
}

#[async_trait]
impl Sink for DiscordSink {
    fn name(&self) -> &str {
        "discord"
    }

    fn is_enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    async fn send(&self, text: &str) -> Result<(), SinkError> {
        if !self.is_enabled() {
            return Err(SinkError::Disabled);
        }

        let body = json!({ "content": Self::format_message(text) });
        post_json(&self.client, &self.webhook_url, &body, self.timeout, self.name()).await
    }
}
