//! Feed and claim outcome types

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// A named, independently rate-limited claim source. Static for the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub id: String,
    pub name: String,
}

impl Feed {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Classified result of one claim attempt. Exactly one per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A frog was claimed. The body is opaque and only logged.
    Success { body: String },
    /// The feed is cooling down until this epoch-ms timestamp.
    Cooldown { until_ms: u64 },
    /// Anything else: transport failure, auth failure, unexpected status.
    Error { raw: String },
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success { .. } => OutcomeKind::Success,
            Outcome::Cooldown { .. } => OutcomeKind::Cooldown,
            Outcome::Error { .. } => OutcomeKind::Error,
        }
    }
}

/// Outcome tag without payload, for status reporting and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Cooldown,
    Error,
}

impl OutcomeKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::Cooldown => "cooldown",
            OutcomeKind::Error => "error",
        }
    }
}

/// Current wall-clock time as unix milliseconds (0 if the clock is before 1970).
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
