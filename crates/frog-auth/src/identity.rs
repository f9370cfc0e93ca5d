//! Account identity: private key material plus its public commitment
//!
//! The identity arrives serialized as a JSON array `["<trapdoor>", "<nullifier>"]`,
//! the shape the account's synced storage keeps it in. Each component is either
//! `0x`-prefixed hex or plain decimal digits. Parsing validates both components
//! and derives the public commitment up front so a malformed identity is
//! rejected before any feed starts.

use std::fmt;

use common::Secret;
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};

use crate::constants::SEED_SEPARATOR;
use crate::error::{Error, Result};

/// Long-lived account identity. Immutable for the process lifetime.
pub struct Identity {
    trapdoor: Secret<String>,
    nullifier: Secret<String>,
    commitment: String,
}

impl Identity {
    /// Parse and validate a serialized identity.
    pub fn from_serialized(raw: &str) -> Result<Self> {
        let parts: Vec<String> = serde_json::from_str(raw.trim()).map_err(|e| {
            Error::MalformedIdentity(format!("expected a JSON array of strings: {e}"))
        })?;

        let [trapdoor, nullifier]: [String; 2] = parts.try_into().map_err(|parts: Vec<String>| {
            Error::MalformedIdentity(format!(
                "expected [trapdoor, nullifier], got {} elements",
                parts.len()
            ))
        })?;

        let trapdoor = Secret::new(normalize_component("trapdoor", &trapdoor)?);
        let nullifier = Secret::new(normalize_component("nullifier", &nullifier)?);

        let mut identity = Self {
            trapdoor,
            nullifier,
            commitment: String::new(),
        };
        identity.commitment = commitment_for(&identity.signing_key());
        Ok(identity)
    }

    /// Public commitment, safe to log and to embed in credentials.
    pub fn commitment(&self) -> &str {
        &self.commitment
    }

    /// Derive the Ed25519 signing key from the private components.
    ///
    /// `seed = SHA-256(trapdoor || 0x00 || nullifier)`
    pub(crate) fn signing_key(&self) -> SigningKey {
        let mut hasher = Sha256::new();
        hasher.update(self.trapdoor.expose().as_bytes());
        hasher.update([SEED_SEPARATOR]);
        hasher.update(self.nullifier.expose().as_bytes());
        let seed: [u8; 32] = hasher.finalize().into();
        SigningKey::from_bytes(&seed)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

/// Hex SHA-256 of the verifying key bytes.
pub(crate) fn commitment_for(key: &SigningKey) -> String {
    hex::encode(Sha256::digest(key.verifying_key().to_bytes()))
}

/// Validate one identity component and return its canonical form.
///
/// Hex components are lowercased with the `0x` prefix kept, so `0xAB` and
/// `0xab` derive the same key.
fn normalize_component(name: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::MalformedIdentity(format!("{name} is empty")));
    }

    if let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::MalformedIdentity(format!(
                "{name} is not valid hex"
            )));
        }
        return Ok(format!("0x{}", digits.to_ascii_lowercase()));
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::MalformedIdentity(format!(
            "{name} must be 0x-prefixed hex or decimal digits"
        )));
    }
    Ok(value.to_owned())
}
