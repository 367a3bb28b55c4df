//! Loop Scheduler - drives generate-append-broadcast cycles forever
//!
//! One driver task per scheduler. Each cycle runs under the single-flight
//! guard; when it settles the driver re-arms a timer whose length depends on
//! the outcome. Shutdown cancels the pending timer. A cycle already in
//! flight is allowed to finish, but its re-arm is discarded.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broadcast::{BroadcastDispatcher, BroadcastReport};
use crate::daemon::guard::SingleFlightGuard;
use crate::daemon::tick::{CycleStats, DelayPolicy};
use crate::domain::{ContentUnit, CycleOutcome, LoopEvent, LoopState, Transcript};
use crate::error::{FeedrError, Result};
use crate::llm::LlmClient;
use crate::prompt::{ContextCompressor, DEFAULT_CONTEXT_BUDGET, DEFAULT_SEED};

/// Placeholder broadcast when the generator returns nothing usable
pub const DEFAULT_FALLBACK_TEXT: &str = "[SIGNAL_LOST]: ...static... the feed returned nothing this cycle.";

/// Capacity of the event channel; slow subscribers lag instead of blocking
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Settings for a scheduler instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub delay_policy: DelayPolicy,
    /// Characters of history handed to the generator
    pub context_budget: usize,
    pub fallback_text: String,
    /// Content of the initial transcript unit
    pub seed: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            delay_policy: DelayPolicy::default(),
            context_budget: DEFAULT_CONTEXT_BUDGET,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            seed: DEFAULT_SEED.to_string(),
        }
    }
}

/// Owns the transcript and runs cycles against a generator and dispatcher.
pub struct LoopScheduler {
    generator: Arc<dyn LlmClient>,
    dispatcher: BroadcastDispatcher,
    transcript: RwLock<Transcript>,
    compressor: ContextCompressor,
    policy: DelayPolicy,
    fallback_text: String,
    guard: SingleFlightGuard,
    state_tx: watch::Sender<LoopState>,
    events: broadcast::Sender<LoopEvent>,
    stats: Mutex<CycleStats>,
    cycle_counter: AtomicU64,
    started: AtomicBool,
}

impl LoopScheduler {
    pub fn new(generator: Arc<dyn LlmClient>, dispatcher: BroadcastDispatcher, config: SchedulerConfig) -> Self {
        let (state_tx, _) = watch::channel(LoopState::Idle);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            generator,
            dispatcher,
            transcript: RwLock::new(Transcript::seeded(config.seed)),
            compressor: ContextCompressor::new(config.context_budget),
            policy: config.delay_policy,
            fallback_text: config.fallback_text,
            guard: SingleFlightGuard::new(),
            state_tx,
            events,
            stats: Mutex::new(CycleStats::new()),
            cycle_counter: AtomicU64::new(0),
            started: AtomicBool::new(false),
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        *self.state_tx.borrow()
    }

    /// Receiver that observes every state change
    pub fn watch_state(&self) -> watch::Receiver<LoopState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to loop events
    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.events.subscribe()
    }

    /// Copy of the transcript as it is now
    pub fn transcript_snapshot(&self) -> Transcript {
        self.read_transcript().clone()
    }

    pub fn stats(&self) -> CycleStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn delay_policy(&self) -> DelayPolicy {
        self.policy
    }

    pub fn dispatcher(&self) -> &BroadcastDispatcher {
        &self.dispatcher
    }

    /// Run one cycle if none is in flight.
    ///
    /// Returns `Skipped` immediately when the guard is held. Never panics on
    /// generator or sink errors; those become `Failed` and report entries.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::debug!("Cycle already in flight, skipping");
            self.record(&CycleOutcome::Skipped);
            return CycleOutcome::Skipped;
        };

        let cycle = self.cycle_counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_state(LoopState::Running);
        self.emit(LoopEvent::CycleStarted { cycle });
        tracing::debug!(cycle, "Cycle started");

        let result = self.generate_and_broadcast(cycle).await;
        drop(permit);

        let outcome = match result {
            Ok((unit, report)) => {
                self.set_state(LoopState::Running);
                CycleOutcome::Succeeded { unit, report }
            }
            Err(e) => self.fail_cycle(cycle, e.to_string()),
        };

        self.record(&outcome);
        outcome
    }

    async fn generate_and_broadcast(&self, cycle: u64) -> Result<(ContentUnit, BroadcastReport)> {
        // Read lock covers the synchronous compress only, never the await
        let context = {
            let transcript = self.read_transcript();
            self.compressor.compress(&transcript)
        };

        let reply = self.generator.generate(&context).await.inspect_err(|e| {
            tracing::warn!(
                cycle,
                retryable = e.is_retryable(),
                rate_limited = e.is_rate_limit(),
                "Generator call failed"
            )
        })?;

        let content = match reply {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::warn!(cycle, "Generator returned no content, using fallback");
                self.fallback_text.clone()
            }
        };

        let unit = self.write_transcript().append(content);
        tracing::info!(cycle, unit_id = %unit.id(), chars = unit.content().chars().count(), "Unit appended");
        self.emit(LoopEvent::UnitAppended(unit.clone()));

        let report = self.dispatcher.broadcast(unit.content()).await;
        if report.is_complete() {
            tracing::info!(cycle, delivered = report.delivered(), "Broadcast settled");
        } else {
            tracing::warn!(
                cycle,
                delivered = report.delivered(),
                failed = report.failed().len(),
                "Broadcast settled with failures"
            );
        }
        self.emit(LoopEvent::Broadcasted(report.clone()));

        Ok((unit, report))
    }

    fn fail_cycle(&self, cycle: u64, error: String) -> CycleOutcome {
        tracing::error!(cycle, error = %error, "Cycle failed");
        self.set_state(LoopState::Recovering);
        self.emit(LoopEvent::CycleFailed {
            cycle,
            error: error.clone(),
        });
        CycleOutcome::Failed(error)
    }

    /// Run one cycle, treating a panic inside it as a failure.
    async fn run_cycle_caught(&self) -> CycleOutcome {
        match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                let cycle = self.cycle_counter.load(Ordering::SeqCst);
                let outcome = self.fail_cycle(cycle, "cycle panicked".to_string());
                self.record(&outcome);
                outcome
            }
        }
    }

    /// Start the driver task.
    ///
    /// A scheduler can only be started once.
    pub fn start(self: &Arc<Self>) -> Result<LoopHandle> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(FeedrError::InvalidState("loop already started".to_string()));
        }

        let cancel = CancellationToken::new();
        let driver = tokio::spawn(Arc::clone(self).drive(cancel.clone()));

        Ok(LoopHandle {
            scheduler: Arc::clone(self),
            cancel,
            driver: Some(driver),
        })
    }

    async fn drive(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(
            model = self.generator.model(),
            sinks = ?self.dispatcher.sink_names(),
            "Loop started"
        );

        loop {
            // Teardown may land before the first poll
            if cancel.is_cancelled() {
                break;
            }

            let outcome = self.run_cycle_caught().await;
            if cancel.is_cancelled() {
                break;
            }

            let delay = self.policy.next_delay(&outcome);
            tracing::debug!(delay_ms = delay.as_millis() as u64, state = %self.state(), "Re-arming");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let stats = self.stats();
        tracing::info!(
            cycles = stats.cycles,
            succeeded = stats.succeeded,
            failed = stats.failed,
            "Loop stopped"
        );
    }

    fn set_state(&self, state: LoopState) {
        let changed = self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if changed {
            tracing::info!(state = %state, "Loop state changed");
            self.emit(LoopEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: LoopEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn record(&self, outcome: &CycleOutcome) {
        self.stats.lock().unwrap_or_else(|e| e.into_inner()).record(outcome);
    }

    fn read_transcript(&self) -> RwLockReadGuard<'_, Transcript> {
        self.transcript.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_transcript(&self) -> RwLockWriteGuard<'_, Transcript> {
        self.transcript.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for LoopScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopScheduler")
            .field("model", &self.generator.model())
            .field("dispatcher", &self.dispatcher)
            .field("state", &self.state())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Control handle for a running loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct LoopHandle {
    scheduler: Arc<LoopScheduler>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<()>>,
}

impl LoopHandle {
    /// Cancel the pending re-arm and wait for the driver to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(driver) = self.driver.take()
            && let Err(e) = driver.await
        {
            log::error!("Loop driver ended abnormally: {}", e);
        }
    }

    /// Run an extra cycle now. Skipped if one is already in flight.
    pub fn trigger(&self) -> JoinHandle<CycleOutcome> {
        let scheduler = Arc::clone(&self.scheduler);
        tokio::spawn(async move { scheduler.run_cycle_caught().await })
    }

    pub fn state(&self) -> LoopState {
        self.scheduler.state()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LoopEvent> {
        self.scheduler.subscribe()
    }

    pub fn scheduler(&self) -> &Arc<LoopScheduler> {
        &self.scheduler
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
