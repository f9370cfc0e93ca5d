//! Configuration types and loading
//!
//! The config file path comes from `--config`, then CONFIG_PATH, then
//! `frog-harvester.toml`. Every setting comes from that file or its default.
//! The identity is loaded from the FROGS_IDENTITY env var, then identity_file,
//! never stored in the TOML directly to avoid leaking the private key material.

use common::Secret;
use frog_feeds::constants::{
    CLAIM_ENDPOINT, CLIENT_ORIGIN, CLIENT_REFERER, DEFAULT_ERROR_BACKOFF, DEFAULT_FEEDS,
    DEFAULT_SUCCESS_DELAY, DEFAULT_TIMEOUT, USER_AGENT,
};
use frog_feeds::{ClaimEndpoint, CooldownPolicy, Feed};
use serde::Deserialize;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var holding the serialized identity
pub const IDENTITY_ENV: &str = "FROGS_IDENTITY";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
}

/// Claim endpoint settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub claim_url: String,
    pub origin: String,
    pub referer: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            claim_url: CLAIM_ENDPOINT.to_string(),
            origin: CLIENT_ORIGIN.to_string(),
            referer: CLIENT_REFERER.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// Where the serialized identity comes from
#[derive(Debug, Default, Deserialize)]
pub struct IdentityConfig {
    #[serde(skip)]
    pub serialized: Option<Secret<String>>,
    /// Path to a file containing the identity (alternative to FROGS_IDENTITY)
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

/// Pacing knobs, in milliseconds
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub success_delay_ms: u64,
    pub error_backoff_ms: u64,
    /// Minimum spacing between claims across all feeds; 0 disables it
    pub min_claim_spacing_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            success_delay_ms: DEFAULT_SUCCESS_DELAY.as_millis() as u64,
            error_backoff_ms: DEFAULT_ERROR_BACKOFF.as_millis() as u64,
            min_claim_spacing_ms: 0,
        }
    }
}

/// Optional status listener
#[derive(Debug, Default, Deserialize)]
pub struct StatusConfig {
    #[serde(default)]
    pub listen_addr: Option<SocketAddr>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub id: String,
}

fn default_feeds() -> Vec<FeedConfig> {
    DEFAULT_FEEDS
        .iter()
        .map(|(name, id)| FeedConfig {
            name: (*name).to_string(),
            id: (*id).to_string(),
        })
        .collect()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Identity resolution order:
    /// 1. FROGS_IDENTITY env var
    /// 2. identity_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.validate()?;

        if let Some(identity) = std::env::var(IDENTITY_ENV)
            .ok()
            .and_then(|raw| Secret::from_trimmed(&raw))
        {
            config.identity.serialized = Some(identity);
        } else if let Some(ref identity_file) = config.identity.identity_file {
            let raw = std::fs::read_to_string(identity_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read identity_file {}: {e}",
                    identity_file.display()
                ))
            })?;
            config.identity.serialized = Secret::from_trimmed(&raw);
        }

        if config.identity.serialized.is_none() {
            return Err(common::Error::MissingIdentity);
        }

        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.api.claim_url.starts_with("http://") && !self.api.claim_url.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "claim_url must start with http:// or https://, got: {}",
                self.api.claim_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.schedule.error_backoff_ms == 0 {
            return Err(common::Error::Config(
                "error_backoff_ms must be greater than 0".into(),
            ));
        }

        if self.feeds.is_empty() {
            return Err(common::Error::Config("at least one feed is required".into()));
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for feed in &self.feeds {
            if feed.id.trim().is_empty() || feed.name.trim().is_empty() {
                return Err(common::Error::Config(
                    "feed name and id must not be empty".into(),
                ));
            }
            if !ids.insert(feed.id.as_str()) {
                return Err(common::Error::Config(format!("duplicate feed id: {}", feed.id)));
            }
            if !names.insert(feed.name.as_str()) {
                return Err(common::Error::Config(format!(
                    "duplicate feed name: {}",
                    feed.name
                )));
            }
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("frog-harvester.toml")
    }

    pub fn endpoint(&self) -> ClaimEndpoint {
        ClaimEndpoint {
            url: self.api.claim_url.clone(),
            origin: self.api.origin.clone(),
            referer: self.api.referer.clone(),
            user_agent: self.api.user_agent.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn policy(&self) -> CooldownPolicy {
        CooldownPolicy::new(
            Duration::from_millis(self.schedule.success_delay_ms),
            Duration::from_millis(self.schedule.error_backoff_ms),
        )
    }

    pub fn claim_spacing(&self) -> Duration {
        Duration::from_millis(self.schedule.min_claim_spacing_ms)
    }

    pub fn feed_list(&self) -> Vec<Feed> {
        self.feeds
            .iter()
            .map(|f| Feed::new(f.name.clone(), f.id.clone()))
            .collect()
    }
}
