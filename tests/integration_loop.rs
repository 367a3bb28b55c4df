//! End-to-end loop integration tests
//!
//! Drives the scheduler against a scripted generator and real Telegram and
//! Discord adapters pointed at local mock servers.

use std::sync::Arc;
use std::time::Duration;

use feedr::broadcast::{BroadcastConfig, BroadcastDispatcher};
use feedr::config::{ArgsSource, ConfigResolver, EnvSource, GlobalConfig, StoredSource, TelegramCredentials};
use feedr::daemon::{DelayPolicy, LoopScheduler, SchedulerConfig};
use feedr::domain::{LoopEvent, LoopState};
use feedr::error::Result;
use feedr::llm::{LlmError, MockLlmClient};
use feedr::sinks::{DiscordSink, SinkDescriptor, SinkError, SinkSettings, TelegramSink};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TG_TOKEN: &str = "123456:TESTTOKEN";
const TG_CHAT: &str = "@feedr_test";

struct Sinks {
    telegram: MockServer,
    discord: MockServer,
}

impl Sinks {
    async fn start(tg_status: u16, discord_status: u16) -> Self {
        let telegram = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendMessage", TG_TOKEN)))
            .respond_with(ResponseTemplate::new(tg_status).set_body_string("{\"ok\":true}"))
            .mount(&telegram)
            .await;

        let discord = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/42/secret"))
            .respond_with(ResponseTemplate::new(discord_status))
            .mount(&discord)
            .await;

        Self { telegram, discord }
    }

    fn config(&self) -> BroadcastConfig {
        BroadcastConfig::default()
            .with(SinkDescriptor::telegram(TG_TOKEN, TG_CHAT))
            .with(SinkDescriptor::discord(format!(
                "{}/api/webhooks/42/secret",
                self.discord.uri()
            )))
    }

    fn settings(&self, timeout: Duration) -> SinkSettings {
        SinkSettings {
            timeout,
            telegram_api_base: self.telegram.uri(),
        }
    }

    fn dispatcher(&self) -> BroadcastDispatcher {
        BroadcastDispatcher::from_config(&self.config(), &self.settings(Duration::from_secs(5)))
    }

    async fn telegram_texts(&self) -> Vec<String> {
        self.telegram
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| {
                let body: serde_json::Value = r.body_json().unwrap();
                body["text"].as_str().unwrap().to_string()
            })
            .collect()
    }

    async fn discord_contents(&self) -> Vec<String> {
        self.discord
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| {
                let body: serde_json::Value = r.body_json().unwrap();
                body["content"].as_str().unwrap().to_string()
            })
            .collect()
    }
}

fn seeded_config() -> SchedulerConfig {
    SchedulerConfig {
        seed: "SEED".to_string(),
        ..Default::default()
    }
}

/// Seed plus one generated unit reaches both channels in their own layout
#[tokio::test]
async fn test_success_cycle_reaches_both_sinks() {
    let sinks = Sinks::start(200, 204).await;
    let scheduler = LoopScheduler::new(
        Arc::new(MockLlmClient::with_texts(["X"])),
        sinks.dispatcher(),
        seeded_config(),
    );

    let outcome = scheduler.run_cycle().await;
    assert!(outcome.is_success());
    assert!(outcome.report().unwrap().is_complete());

    let transcript = scheduler.transcript_snapshot();
    assert_eq!(transcript.contents().collect::<Vec<_>>(), vec!["SEED", "X"]);
    assert!(transcript.units()[0].created_at() <= transcript.units()[1].created_at());

    assert_eq!(sinks.telegram_texts().await, vec![TelegramSink::format_message("X")]);
    assert_eq!(sinks.discord_contents().await, vec![DiscordSink::format_message("X")]);
    assert_eq!(scheduler.state(), LoopState::Running);
}

/// A failing cycle moves to RECOVERING; the next success appends and recovers
#[tokio::test]
async fn test_failure_then_success() {
    let sinks = Sinks::start(200, 204).await;
    let generator = MockLlmClient::new(vec![
        Err(LlmError::ApiError {
            status: 500,
            message: "internal".into(),
        }),
        Ok(Some("back online".to_string())),
    ]);
    let scheduler = LoopScheduler::new(Arc::new(generator), sinks.dispatcher(), seeded_config());
    let mut states = scheduler.watch_state();

    let outcome = scheduler.run_cycle().await;
    assert!(outcome.is_failure());
    assert_eq!(*states.borrow_and_update(), LoopState::Recovering);
    assert_eq!(scheduler.transcript_snapshot().len(), 1);
    assert!(sinks.telegram_texts().await.is_empty());

    let outcome = scheduler.run_cycle().await;
    assert!(outcome.is_success());
    assert_eq!(*states.borrow_and_update(), LoopState::Running);
    assert_eq!(scheduler.transcript_snapshot().last().content(), "back online");
    assert_eq!(sinks.discord_contents().await.len(), 1);
}

/// One channel rejecting the unit does not fail the cycle
#[tokio::test]
async fn test_rejecting_sink_is_isolated() {
    let sinks = Sinks::start(200, 500).await;
    let scheduler = LoopScheduler::new(
        Arc::new(MockLlmClient::with_texts(["X"])),
        sinks.dispatcher(),
        seeded_config(),
    );

    let outcome = scheduler.run_cycle().await;
    assert!(outcome.is_success());

    let report = outcome.report().unwrap();
    assert_eq!(report.deliveries.len(), 2);
    assert_eq!(report.delivered(), 1);
    assert!(report.get("telegram").unwrap().is_delivered());
    assert!(matches!(
        report.get("discord").unwrap().result,
        Err(SinkError::Rejected { status: 500, .. })
    ));
    assert_eq!(
        scheduler.delay_policy().next_delay(&outcome),
        DelayPolicy::default().success_delay
    );
}

/// A hung channel is cut off by its own timeout
#[tokio::test]
async fn test_slow_sink_times_out_independently() {
    let telegram = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&telegram)
        .await;
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&discord)
        .await;

    let config = BroadcastConfig::default()
        .with(SinkDescriptor::telegram(TG_TOKEN, TG_CHAT))
        .with(SinkDescriptor::discord(discord.uri()));
    let settings = SinkSettings {
        timeout: Duration::from_millis(200),
        telegram_api_base: telegram.uri(),
    };
    let scheduler = LoopScheduler::new(
        Arc::new(MockLlmClient::with_texts(["X"])),
        BroadcastDispatcher::from_config(&config, &settings),
        seeded_config(),
    );

    let started = std::time::Instant::now();
    let outcome = scheduler.run_cycle().await;
    assert!(started.elapsed() < Duration::from_secs(4));

    let report = outcome.report().unwrap();
    assert_eq!(
        report.get("telegram").unwrap().result,
        Err(SinkError::Timeout(Duration::from_millis(200)))
    );
    assert!(report.get("discord").unwrap().is_delivered());
}

/// Oversized units are truncated per channel
#[tokio::test]
async fn test_long_unit_truncated_per_channel() {
    let sinks = Sinks::start(200, 204).await;
    let long = "w".repeat(5000);
    let scheduler = LoopScheduler::new(
        Arc::new(MockLlmClient::with_texts([long.clone()])),
        sinks.dispatcher(),
        seeded_config(),
    );

    scheduler.run_cycle().await;

    // The transcript keeps the full text
    assert_eq!(scheduler.transcript_snapshot().last().content(), long);
    assert_eq!(sinks.telegram_texts().await, vec![TelegramSink::format_message(&long)]);
    let discord = sinks.discord_contents().await;
    assert!(discord[0].contains("... [SIGNAL_TRUNCATED]"));
    assert!(discord[0].chars().count() <= 2000);
}

/// The driver keeps cycling on its own and stops on shutdown
#[tokio::test]
async fn test_driver_runs_until_shutdown() {
    let sinks = Sinks::start(200, 204).await;
    let config = SchedulerConfig {
        delay_policy: DelayPolicy::new(Duration::from_millis(50), Duration::from_millis(20)),
        ..seeded_config()
    };
    let scheduler = Arc::new(LoopScheduler::new(
        Arc::new(MockLlmClient::repeating("tick")),
        sinks.dispatcher(),
        config,
    ));
    let mut events = scheduler.subscribe();
    let handle = scheduler.start().unwrap();

    let mut appended = 0;
    while appended < 3 {
        if let Ok(LoopEvent::UnitAppended(_)) = events.recv().await {
            appended += 1;
        }
    }
    handle.shutdown().await;

    let units = scheduler.transcript_snapshot().len();
    assert!(units >= 4);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(scheduler.transcript_snapshot().len(), units);

    let created: Vec<_> = scheduler
        .transcript_snapshot()
        .units()
        .iter()
        .map(|u| u.created_at())
        .collect();
    assert!(created.windows(2).all(|w| w[0] <= w[1]));
}

/// Stored credentials start the loop when nothing else is given
#[tokio::test]
async fn test_stored_config_starts_loop() -> Result<()> {
    let sinks = Sinks::start(200, 204).await;
    let mut global = GlobalConfig::default();
    global.broadcast.telegram = Some(TelegramCredentials {
        bot_token: TG_TOKEN.to_string(),
        chat_id: TG_CHAT.to_string(),
    });
    global.broadcast.telegram_api_base = sinks.telegram.uri();

    let resolver = ConfigResolver::new(vec![
        Box::new(ArgsSource::default()),
        Box::new(EnvSource::with_lookup(|_| None)),
        Box::new(StoredSource::new(global.stored_broadcast())),
    ]);
    let resolved = resolver.resolve()?;
    assert_eq!(resolved.source, "stored");

    let scheduler = LoopScheduler::new(
        Arc::new(MockLlmClient::with_texts(["from stored"])),
        BroadcastDispatcher::from_config(&resolved.broadcast, &global.sink_settings()),
        global.scheduler_config(),
    );
    scheduler.run_cycle().await;

    assert_eq!(
        sinks.telegram_texts().await,
        vec![TelegramSink::format_message("from stored")]
    );
    assert!(sinks.discord_contents().await.is_empty());
    Ok(())
}

/// Without any enabled sink the loop is not started
#[test]
fn test_missing_configuration_is_not_started() {
    let global = GlobalConfig::default();
    let resolver = ConfigResolver::new(vec![
        Box::new(ArgsSource::new(Some("token-only".into()), None, None)),
        Box::new(EnvSource::with_lookup(|_| None)),
        Box::new(StoredSource::new(global.stored_broadcast())),
    ]);

    let err = resolver.resolve().unwrap_err();
    assert!(err.is_configuration_missing());
}
