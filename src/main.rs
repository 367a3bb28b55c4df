use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

mod cli;

use cli::Cli;
use cli::commands::{Commands, SinkArgs};
use feedr::broadcast::BroadcastDispatcher;
use feedr::config::{ConfigResolver, GlobalConfig, ResolvedConfig, load_config};
use feedr::daemon::LoopScheduler;
use feedr::domain::{ContentUnit, LoopEvent};
use feedr::llm::{GEMINI_API_KEY_ENV, GeminiClient, LlmClient, MockLlmClient};

/// Content produced by the generator in dry-run mode
const DRY_RUN_TEXT: &str = "[DRY_RUN]: local generator, no upstream call was made.";

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("feedr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run { sinks, dry_run } => handle_run_command(sinks, *dry_run, cli.is_verbose(), config).await,
        Commands::Check { sinks } => handle_check_command(sinks, config),
    }
}

/// Resolve sink configuration; `None` means the loop must not start.
fn resolve_broadcast(sinks: &SinkArgs, config: &GlobalConfig) -> Result<Option<ResolvedConfig>> {
    match ConfigResolver::standard(sinks.to_source(), config).resolve() {
        Ok(resolved) => Ok(Some(resolved)),
        Err(e) if e.is_configuration_missing() => {
            info!("Not started: {}", e);
            println!("{} {}", "Not started:".yellow(), e);
            println!("  Provide --tg-token/--tg-chat or --discord,");
            println!("  the FEEDR_* environment variables, or a broadcast section in feedr.yml");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn build_generator(config: &GlobalConfig, dry_run: bool) -> Result<Arc<dyn LlmClient>> {
    if dry_run {
        info!("Dry run: using local generator");
        return Ok(Arc::new(MockLlmClient::repeating(DRY_RUN_TEXT)));
    }

    let api_key = config
        .api_key(|key| std::env::var(key).ok())
        .ok_or_else(|| eyre!("No Gemini API key: set {} or generation.api-key", GEMINI_API_KEY_ENV))?;
    let client = GeminiClient::with_api_key(api_key, config.gemini_config(), config.prompt_template())
        .context("Failed to create Gemini client")?;
    Ok(Arc::new(client))
}

fn print_unit(unit: &ContentUnit) {
    println!(
        "{} {}",
        format!("[{}]", unit.created_at().format("%H:%M:%S")).dimmed(),
        unit.id().cyan()
    );
    println!("{}\n", unit.content());
}

async fn handle_run_command(sinks: &SinkArgs, dry_run: bool, verbose: bool, config: &GlobalConfig) -> Result<()> {
    let Some(resolved) = resolve_broadcast(sinks, config)? else {
        return Ok(());
    };

    let generator = build_generator(config, dry_run)?;
    let dispatcher = BroadcastDispatcher::from_config(&resolved.broadcast, &config.sink_settings());
    let scheduler = Arc::new(LoopScheduler::new(generator, dispatcher, config.scheduler_config()));

    println!(
        "{} broadcasting to {} (config from {})",
        "Starting feed:".green(),
        scheduler.dispatcher().sink_names().join(", "),
        resolved.source
    );
    print_unit(scheduler.transcript_snapshot().last());

    let mut events = scheduler.subscribe();
    let handle = scheduler.start()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(LoopEvent::UnitAppended(unit)) => print_unit(&unit),
                Ok(LoopEvent::Broadcasted(report)) => {
                    for failed in report.failed() {
                        if let Err(e) = &failed.result {
                            println!("{} {}: {}", "Broadcast failed:".red(), failed.sink, e);
                        }
                    }
                }
                Ok(LoopEvent::CycleFailed { cycle, error }) => {
                    println!("{} cycle {}: {}", "Generation failed:".red(), cycle, error);
                }
                Ok(LoopEvent::StateChanged(state)) if verbose => {
                    let label = if state.is_healthy() {
                        state.to_string().green()
                    } else {
                        state.to_string().yellow()
                    };
                    println!("{} {}", "State:".dimmed(), label);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => log::warn!("Console lagged, {} events skipped", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    }

    println!("{}", "Stopping feed...".cyan());
    handle.shutdown().await;

    let stats = scheduler.stats();
    println!(
        "{} {} cycles, {} succeeded, {} failed, {} units",
        "Stopped:".green(),
        stats.cycles,
        stats.succeeded,
        stats.failed,
        scheduler.transcript_snapshot().len()
    );
    Ok(())
}

fn handle_check_command(sinks: &SinkArgs, config: &GlobalConfig) -> Result<()> {
    let Some(resolved) = resolve_broadcast(sinks, config)? else {
        return Ok(());
    };

    println!("{} {}", "Config source:".green(), resolved.source);
    for sink in resolved.broadcast.enabled() {
        println!("  {} {}", "sink".cyan(), sink.describe());
    }

    let policy = config.delay_policy();
    println!("{} {}", "Model:".green(), config.generation.model);
    println!(
        "{} success {:?}, failure {:?}",
        "Delays:".green(),
        policy.success_delay,
        policy.failure_delay
    );
    println!("{} {} characters", "Context budget:".green(), config.cadence.context_budget);
    println!("{} {:?}", "Sink timeout:".green(), config.sink_settings().timeout);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
