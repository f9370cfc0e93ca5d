//! Per-feed polling loop
//!
//! A `FeedScheduler` cycles `Idle → Requesting → Classifying → Sleeping` until
//! the cancellation token fires. Claim failures are outcomes, not errors: the
//! loop only ends on cancellation or when the credential issuer fails, which
//! is fatal for every feed and cancels the shared token.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use frog_auth::CredentialIssuer;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::claim::Claimer;
use crate::cooldown::CooldownPolicy;
use crate::error::{Error, Result};
use crate::feed::{Feed, Outcome, OutcomeKind, epoch_millis};
use crate::gate::AdmissionGate;

/// Where a scheduler is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    Idle,
    Requesting,
    Classifying,
    Sleeping,
    Stopped,
}

impl FeedPhase {
    pub fn label(&self) -> &'static str {
        match self {
            FeedPhase::Idle => "idle",
            FeedPhase::Requesting => "requesting",
            FeedPhase::Classifying => "classifying",
            FeedPhase::Sleeping => "sleeping",
            FeedPhase::Stopped => "stopped",
        }
    }
}

/// Snapshot of one feed's loop, read by the status endpoint.
///
/// Only the most recent cycle is kept; the counters are for operators.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStatus {
    pub phase: FeedPhase,
    pub last_outcome: Option<OutcomeKind>,
    pub last_delay_ms: Option<u64>,
    /// Epoch-ms of the next attempt while sleeping
    pub next_attempt_ms: Option<u64>,
    pub attempts: u64,
    pub successes: u64,
    pub cooldowns: u64,
    pub errors: u64,
}

impl Default for FeedStatus {
    fn default() -> Self {
        Self {
            phase: FeedPhase::Idle,
            last_outcome: None,
            last_delay_ms: None,
            next_attempt_ms: None,
            attempts: 0,
            successes: 0,
            cooldowns: 0,
            errors: 0,
        }
    }
}

impl FeedStatus {
    fn record(&mut self, kind: OutcomeKind, delay: Duration, now_ms: u64) {
        self.attempts += 1;
        match kind {
            OutcomeKind::Success => self.successes += 1,
            OutcomeKind::Cooldown => self.cooldowns += 1,
            OutcomeKind::Error => self.errors += 1,
        }
        let delay_ms = delay.as_millis() as u64;
        self.last_outcome = Some(kind);
        self.last_delay_ms = Some(delay_ms);
        self.next_attempt_ms = Some(now_ms.saturating_add(delay_ms));
    }
}

/// Dependencies every scheduler shares.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub issuer: Arc<dyn CredentialIssuer>,
    pub claimer: Arc<dyn Claimer>,
    pub policy: CooldownPolicy,
    pub gate: Arc<AdmissionGate>,
}

/// Independent polling loop for one feed.
pub struct FeedScheduler {
    feed: Feed,
    deps: SchedulerDeps,
    status: Arc<RwLock<FeedStatus>>,
    token: CancellationToken,
}

impl FeedScheduler {
    pub fn new(feed: Feed, deps: SchedulerDeps, token: CancellationToken) -> Self {
        Self {
            feed,
            deps,
            status: Arc::new(RwLock::new(FeedStatus::default())),
            token,
        }
    }

    /// Publish status into an existing handle (the engine's).
    pub fn with_status(mut self, status: Arc<RwLock<FeedStatus>>) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> Arc<RwLock<FeedStatus>> {
        self.status.clone()
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Run until cancelled. Returns an error only for fatal issuer failures.
    pub async fn run(self) -> Result<()> {
        info!(feed = %self.feed.name, feed_id = %self.feed.id, "feed scheduler started");

        let result = loop {
            match self.cycle().await {
                Ok(ControlFlow::Continue(())) => continue,
                Ok(ControlFlow::Break(())) => break Ok(()),
                Err(e) => {
                    error!(feed = %self.feed.name, error = %e, "fatal error, stopping all feeds");
                    self.token.cancel();
                    break Err(e);
                }
            }
        };

        self.set_phase(FeedPhase::Stopped).await;
        info!(feed = %self.feed.name, "feed scheduler stopped");
        result
    }

    /// One full cycle. `Break` means the token was cancelled.
    async fn cycle(&self) -> Result<ControlFlow<()>> {
        self.set_phase(FeedPhase::Idle).await;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(ControlFlow::Break(())),
            _ = self.deps.gate.admit() => {}
        }

        self.set_phase(FeedPhase::Requesting).await;
        let credential = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(ControlFlow::Break(())),
            issued = self.deps.issuer.issue() => issued
                .map_err(|e| Error::Credential(format!("{}: {e}", self.feed.name)))?,
        };

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(ControlFlow::Break(())),
            outcome = self.deps.claimer.claim(&self.feed, credential) => outcome,
        };
        let elapsed = started.elapsed();

        self.set_phase(FeedPhase::Classifying).await;
        let now_ms = epoch_millis();
        let delay = self.deps.policy.next_delay(&outcome, now_ms);
        self.report(&outcome, delay, now_ms, elapsed).await;

        self.set_phase(FeedPhase::Sleeping).await;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Ok(ControlFlow::Break(())),
            _ = tokio::time::sleep(delay) => Ok(ControlFlow::Continue(())),
        }
    }

    /// Log the status line, record metrics and update the snapshot.
    async fn report(&self, outcome: &Outcome, delay: Duration, now_ms: u64, elapsed: Duration) {
        let name = &self.feed.name;
        let delay_ms = delay.as_millis() as u64;
        match outcome {
            Outcome::Success { body } => {
                info!(feed = %name, delay_ms, "searched {name} and found a frog");
                debug!(feed = %name, payload = %body, "claim payload");
            }
            Outcome::Cooldown { until_ms } => {
                info!(
                    feed = %name,
                    until_ms,
                    delay_ms,
                    "{name} on cooldown until {}",
                    local_time(*until_ms)
                );
            }
            Outcome::Error { raw } => {
                warn!(feed = %name, error = %raw, delay_ms, "error searching {name}, backing off");
            }
        }

        let kind = outcome.kind();
        crate::metrics::record_claim(name, kind, elapsed);
        crate::metrics::record_next_delay(name, delay);
        self.status.write().await.record(kind, delay, now_ms);
    }

    async fn set_phase(&self, phase: FeedPhase) {
        let mut status = self.status.write().await;
        status.phase = phase;
        // next_attempt_ms only means something while sleeping
        if matches!(phase, FeedPhase::Idle | FeedPhase::Stopped) {
            status.next_attempt_ms = None;
        }
    }
}

/// Local wall-clock rendering of an epoch-ms timestamp, for log lines.
fn local_time(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%d %b %y %-I:%M %p (UTC%:z)")
                .to_string()
        })
        .unwrap_or_else(|| epoch_ms.to_string())
}
