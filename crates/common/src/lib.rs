//! Types shared by the frog harvester crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
