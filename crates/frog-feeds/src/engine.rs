//! Engine: one scheduler task per feed
//!
//! The engine owns the cancellation token shared by every scheduler. It
//! prepares the credential issuer once, spawns the schedulers, and returns
//! when all of them have stopped. The first fatal scheduler error cancels
//! the rest and is what `run` returns.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::feed::Feed;
use crate::scheduler::{FeedScheduler, FeedStatus, SchedulerDeps};

pub struct Engine {
    feeds: Vec<(Feed, Arc<RwLock<FeedStatus>>)>,
    deps: SchedulerDeps,
    token: CancellationToken,
}

impl Engine {
    /// Build an engine over `feeds`. At least one feed is required.
    pub fn new(feeds: Vec<Feed>, deps: SchedulerDeps) -> Result<Self> {
        if feeds.is_empty() {
            return Err(Error::NoFeeds);
        }
        let feeds = feeds
            .into_iter()
            .map(|feed| (feed, Arc::new(RwLock::new(FeedStatus::default()))))
            .collect();
        Ok(Self {
            feeds,
            deps,
            token: CancellationToken::new(),
        })
    }

    /// Token that stops every scheduler when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            info!("stopping all feeds");
        }
        self.token.cancel();
    }

    pub fn feeds(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.iter().map(|(feed, _)| feed)
    }

    /// Prepare the issuer, then run every feed until cancellation or a fatal error.
    pub async fn run(&self) -> Result<()> {
        let prepared = tokio::select! {
            biased;
            _ = self.token.cancelled() => return Ok(()),
            prepared = self.deps.issuer.prepare() => prepared,
        };
        if let Err(e) = prepared {
            error!(error = %e, "failed to prepare credentials");
            self.token.cancel();
            return Err(Error::Credential(e.to_string()));
        }

        let mut tasks = JoinSet::new();
        for (feed, status) in &self.feeds {
            let scheduler = FeedScheduler::new(feed.clone(), self.deps.clone(), self.token.clone())
                .with_status(status.clone());
            tasks.spawn(scheduler.run());
        }
        info!(feeds = self.feeds.len(), "engine started");

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(e) => {
                    error!(error = %e, "scheduler task panicked");
                    self.token.cancel();
                    Error::Task(e.to_string())
                }
            };
            first_error.get_or_insert(failure);
        }

        info!("engine stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// JSON snapshot of the engine and every feed.
    pub async fn health(&self) -> serde_json::Value {
        let mut feeds = Vec::with_capacity(self.feeds.len());
        for (feed, status) in &self.feeds {
            let status = status.read().await.clone();
            feeds.push(serde_json::json!({
                "name": feed.name,
                "id": feed.id,
                "phase": status.phase,
                "last_outcome": status.last_outcome,
                "last_delay_ms": status.last_delay_ms,
                "next_attempt_ms": status.next_attempt_ms,
                "attempts": status.attempts,
                "successes": status.successes,
                "cooldowns": status.cooldowns,
                "errors": status.errors,
            }));
        }

        let state = if self.token.is_cancelled() {
            "stopped"
        } else {
            "running"
        };

        serde_json::json!({
            "status": state,
            "feeds_total": self.feeds.len(),
            "feeds": feeds,
        })
    }
}
