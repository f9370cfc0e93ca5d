//! Configuration-level error types

use thiserror::Error;

/// Errors raised while loading and validating harvester configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No identity configured: set FROGS_IDENTITY or [identity].identity_file")]
    MissingIdentity,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
