//! Outcome → next-poll delay
//!
//! Pure and total: every outcome maps to exactly one non-negative delay, and
//! errors never retry immediately.

use std::time::Duration;

use crate::constants::{DEFAULT_ERROR_BACKOFF, DEFAULT_SUCCESS_DELAY};
use crate::feed::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Delay after a claimed frog
    pub success_delay: Duration,
    /// Delay after an unclassified error
    pub error_backoff: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            success_delay: DEFAULT_SUCCESS_DELAY,
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }
}

impl CooldownPolicy {
    pub fn new(success_delay: Duration, error_backoff: Duration) -> Self {
        Self {
            success_delay,
            error_backoff,
        }
    }

    /// Delay before the next attempt, given the outcome and the current epoch-ms.
    ///
    /// - `Success` → `success_delay` (re-poll to learn the new cooldown window)
    /// - `Cooldown(until)` → `max(0, until - now)`
    /// - `Error` → `error_backoff`
    pub fn next_delay(&self, outcome: &Outcome, now_ms: u64) -> Duration {
        match outcome {
            Outcome::Success { .. } => self.success_delay,
            Outcome::Cooldown { until_ms } => {
                Duration::from_millis(until_ms.saturating_sub(now_ms))
            }
            Outcome::Error { .. } => self.error_backoff,
        }
    }
}
