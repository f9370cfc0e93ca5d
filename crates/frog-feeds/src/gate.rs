//! Optional account-wide admission gate
//!
//! Feeds share one account identity. If the upstream service also limits the
//! account as a whole, spacing claim requests across all feeds keeps the
//! schedulers from bursting together. A zero spacing disables the gate and
//! every feed runs purely on its own cooldown.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Hands out request slots at least `spacing` apart, across all callers.
#[derive(Debug)]
pub struct AdmissionGate {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl AdmissionGate {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(None),
        }
    }

    /// Gate that admits everything immediately.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.spacing.is_zero()
    }

    /// Wait for this caller's slot.
    ///
    /// The slot is reserved under the lock and waited for outside it, so one
    /// slow waiter never blocks others from reserving later slots.
    pub async fn admit(&self) {
        if !self.is_enabled() {
            return;
        }

        let now = Instant::now();
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.spacing);
            slot
        };

        if slot > now {
            debug!(wait_ms = (slot - now).as_millis() as u64, "waiting for admission slot");
            tokio::time::sleep_until(slot).await;
        }
    }
}
