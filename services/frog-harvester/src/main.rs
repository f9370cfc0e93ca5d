//! Frog harvester
//!
//! Single-binary service that:
//! 1. Loads the identity and feed list from config
//! 2. Signs a fresh credential for every claim attempt
//! 3. Polls every feed on its own schedule, honouring server cooldowns
//! 4. Optionally serves `/health` and `/metrics`

mod config;
mod metrics;
mod status;

use anyhow::{Context, Result};
use frog_auth::{Identity, SignatureIssuer};
use frog_feeds::{AdmissionGate, Engine, HttpClaimer, SchedulerDeps};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::status::StatusState;

/// How long schedulers get to observe cancellation before the process exits.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    info!("starting frog-harvester");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let serialized = config
        .identity
        .serialized
        .as_ref()
        .ok_or(common::Error::MissingIdentity)?;
    let identity =
        Identity::from_serialized(serialized.expose()).context("failed to parse identity")?;

    info!(
        claim_url = %config.api.claim_url,
        commitment = %identity.commitment(),
        feeds = config.feeds.len(),
        min_claim_spacing_ms = config.schedule.min_claim_spacing_ms,
        "configuration loaded"
    );

    let claimer = HttpClaimer::new(reqwest::Client::new(), &config.endpoint())
        .context("invalid claim endpoint settings")?;

    let deps = SchedulerDeps {
        issuer: Arc::new(SignatureIssuer::new(Arc::new(identity))),
        claimer: Arc::new(claimer),
        policy: config.policy(),
        gate: Arc::new(AdmissionGate::new(config.claim_spacing())),
    };
    let engine = Arc::new(Engine::new(config.feed_list(), deps).context("failed to build engine")?);

    let server = match config.status.listen_addr {
        Some(addr) => {
            // Install the recorder only when something will render it
            let prometheus = metrics::install_recorder()?;
            let app = status::build_router(StatusState {
                engine: engine.clone(),
                prometheus,
            });
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind status listener to {addr}"))?;
            info!(addr = %addr, "status listener ready");

            let token = engine.cancellation_token();
            Some(tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async move { token.cancelled().await })
                    .await
            }))
        }
        None => None,
    };

    let mut runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run().await })
    };

    let outcome = tokio::select! {
        joined = &mut runner => Some(joined),
        _ = shutdown_signal() => None,
    };

    let result = match outcome {
        Some(joined) => joined.context("engine task panicked")?,
        None => {
            engine.shutdown();
            match tokio::time::timeout(DRAIN_TIMEOUT, runner).await {
                Ok(joined) => joined.context("engine task panicked")?,
                Err(_) => {
                    warn!(
                        drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
                        "feeds did not stop in time, forcing shutdown"
                    );
                    Ok(())
                }
            }
        }
    };

    // Stop the status listener whatever ended the engine
    engine.shutdown();
    if let Some(server) = server {
        match tokio::time::timeout(DRAIN_TIMEOUT, server).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!(error = %e, "status server error during shutdown"),
            Ok(Err(e)) => error!(error = %e, "status server task panicked"),
            Err(_) => warn!("status server did not stop in time"),
        }
    }

    result.context("harvester stopped on a fatal error")?;
    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
