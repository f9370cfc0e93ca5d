//! Error types for engine and scheduler operations

/// Errors that stop the engine.
///
/// Per-attempt claim failures never show up here: they are folded into
/// `Outcome::Error` and handled by the cooldown policy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no feeds configured")]
    NoFeeds,

    #[error("credential issuance failed: {0}")]
    Credential(String),

    #[error("invalid claim endpoint: {0}")]
    Endpoint(String),

    #[error("scheduler task failed: {0}")]
    Task(String),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
