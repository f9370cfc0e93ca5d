//! Prometheus recorder for the claim metrics
//!
//! The metrics themselves are recorded by `frog_feeds::metrics`; this module
//! only installs the exporter that renders them on `/metrics`.

use anyhow::{Context, Result};
use frog_feeds::metrics::CLAIM_DURATION_SECONDS;
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Claim round-trips range from tens of milliseconds up to the request timeout.
const CLAIM_DURATION_BUCKETS: &[f64] = &[
    0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

fn builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(CLAIM_DURATION_SECONDS.to_string()),
            CLAIM_DURATION_BUCKETS,
        )
        .context("failed to set histogram buckets")
}

/// Install the global Prometheus recorder and return a handle for rendering.
///
/// Without explicit buckets the claim duration would render as a summary.
pub fn install_recorder() -> Result<PrometheusHandle> {
    builder()?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}
