//! Error types for identity and credential operations

/// Errors from identity parsing and credential issuance.
///
/// All of these are fatal to the engine: a broken identity cannot serve any feed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("credential encoding error: {0}")]
    Encoding(String),

    #[error("credential verification failed: {0}")]
    Verification(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
