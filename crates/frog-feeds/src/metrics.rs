//! Claim metrics
//!
//! Recorded through the `metrics` facade; the harvester binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.
//!
//! - `frog_claims_total` (counter): labels `feed`, `outcome`
//! - `frog_claim_duration_seconds` (histogram): label `feed`
//! - `frog_next_delay_seconds` (gauge): label `feed`

use std::time::Duration;

use crate::feed::OutcomeKind;

pub const CLAIMS_TOTAL: &str = "frog_claims_total";
pub const CLAIM_DURATION_SECONDS: &str = "frog_claim_duration_seconds";
pub const NEXT_DELAY_SECONDS: &str = "frog_next_delay_seconds";

/// Record one completed claim attempt.
pub fn record_claim(feed: &str, outcome: OutcomeKind, duration: Duration) {
    metrics::counter!(CLAIMS_TOTAL, "feed" => feed.to_string(), "outcome" => outcome.label())
        .increment(1);
    metrics::histogram!(CLAIM_DURATION_SECONDS, "feed" => feed.to_string())
        .record(duration.as_secs_f64());
}

/// Record the delay chosen before the feed's next attempt.
pub fn record_next_delay(feed: &str, delay: Duration) {
    metrics::gauge!(NEXT_DELAY_SECONDS, "feed" => feed.to_string()).set(delay.as_secs_f64());
}
