//! Identity and credential issuance for frog claims
//!
//! Turns the long-lived account identity into the signed, request-scoped
//! credentials ("PCDs") the claim endpoint expects. The identity is supplied
//! from outside (login is not handled here); this crate only validates it,
//! derives signing material from it once, and signs a fresh credential for
//! every claim attempt.
//!
//! Credential flow:
//! 1. Caller parses the serialized identity via `Identity::from_serialized()`
//! 2. `SignatureIssuer::prepare()` derives and caches the signing key
//! 3. Each claim calls `CredentialIssuer::issue()` for a fresh credential
//! 4. The credential is embedded as the `pcd` field of the claim body
//!
//! # Signature scheme
//!
//! `SignatureIssuer` signs with Ed25519 over a key derived by SHA-256 from the
//! identity. This is a substitute for the upstream scheme, which expects a
//! Semaphore (Groth16) signature proof under the same `type` tag. The
//! upstream endpoint rejects these credentials, so a deployment against it
//! needs a `CredentialIssuer` backed by a real Semaphore prover; the envelope
//! and the claim path stay the same.

pub mod constants;
pub mod credential;
pub mod error;
pub mod identity;
pub mod issuer;

pub use constants::*;
pub use credential::{Credential, SignatureClaim, SignaturePcd, SignatureProof};
pub use error::{Error, Result};
pub use identity::Identity;
pub use issuer::{CredentialIssuer, SignatureIssuer};
