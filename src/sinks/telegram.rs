//! Telegram Bot API sink - posts each unit via `sendMessage`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{DEFAULT_SINK_TIMEOUT, Sink, SinkError, post_json, truncate_payload};

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Max characters of content per message (Telegram's hard cap is 4096,
/// the rest is left for the wrapping)
pub const TELEGRAM_TEXT_LIMIT: usize = 4000;

/// Telegram channel sink.
pub struct TelegramSink {
    client: Client,
    bot_token: String,
    chat_id: String,
    api_base: String,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(client: Client, bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
            timeout: DEFAULT_SINK_TIMEOUT,
        }
    }

    /// Point the sink at a different Bot API server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base.trim_end_matches('/'), self.bot_token, method)
    }

    /// Wrap content in the channel's message layout.
    pub fn format_message(text: &str) -> String {
        format!(
            "👁️ *INCOMING TRANSMISSION* 👁️\n\n{}\n\n#feedr_autonomous",
            truncate_payload(text, TELEGRAM_TEXT_LIMIT)
        )
    }
}

#[async_trait]
impl Sink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }

    async fn send(&self, text: &str) -> Result<(), SinkError> {
        if !self.is_enabled() {
            return Err(SinkError::Disabled);
        }

        let body = json!({
            "chat_id": self.chat_id,
            "text": Self::format_message(text),
            "parse_mode": "Markdown",
        });

        post_json(&self.client, &self.api_url("sendMessage"), &body, self.timeout, self.name()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::TRUNCATION_MARKER;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(server: &MockServer) -> TelegramSink {
        TelegramSink::new(Client::new(), "123:abc", "@feed").with_api_base(server.uri())
    }

    fn core_text(message: &str) -> &str {
        message
            .trim_start_matches("👁️ *INCOMING TRANSMISSION* 👁️\n\n")
            .trim_end_matches("\n\n#feedr_autonomous")
    }

    #[test]
    fn test_format_message_wraps_text() {
        let message = TelegramSink::format_message("X");
        assert!(message.starts_with("👁️ *INCOMING TRANSMISSION* 👁️"));
        assert!(message.contains("\n\nX\n\n"));
        assert_eq!(core_text(&message), "X");
    }

    #[test]
    fn test_format_message_truncates_exactly() {
        let text = "z".repeat(TELEGRAM_TEXT_LIMIT + 500);
        let message = TelegramSink::format_message(&text);
        let core = core_text(&message);
        let marker_len = TRUNCATION_MARKER.chars().count();

        assert!(core.ends_with(TRUNCATION_MARKER));
        let kept = core.trim_end_matches(TRUNCATION_MARKER);
        assert_eq!(kept.chars().count(), TELEGRAM_TEXT_LIMIT - marker_len);
        assert_eq!(core.chars().count(), TELEGRAM_TEXT_LIMIT);
    }

    #[test]
    fn test_disabled_without_chat() {
        let sink = TelegramSink::new(Client::new(), "123:abc", "");
        assert!(!sink.is_enabled());
    }

    #[tokio::test]
    async fn test_send_posts_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        sink.send("hello feed").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["chat_id"], "@feed");
        assert_eq!(body["parse_mode"], "Markdown");
        assert!(body["text"].as_str().unwrap().contains("hello feed"));
    }

    #[tokio::test]
    async fn test_send_non_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request: chat not found"))
            .mount(&server)
            .await;

        let sink = sink_for(&server);
        match sink.send("x").await {
            Err(SinkError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("chat not found"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let sink = sink_for(&server).with_timeout(Duration::from_millis(50));
        assert_eq!(
            sink.send("x").await,
            Err(SinkError::Timeout(Duration::from_millis(50)))
        );
    }

    #[tokio::test]
    async fn test_send_disabled() {
        let sink = TelegramSink::new(Client::new(), "", "@feed");
        assert_eq!(sink.send("x").await, Err(SinkError::Disabled));
    }
}
