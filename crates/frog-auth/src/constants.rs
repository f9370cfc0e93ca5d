//! Credential format constants
//!
//! Values the claim endpoint uses to recognise a signature credential. These
//! identify the wire format only; no secret material lives here.

/// `type` tag of a serialized signature credential.
///
/// Upstream uses this tag for Semaphore proofs; credentials from
/// `SignatureIssuer` reuse it with an Ed25519 proof body.
pub const SIGNATURE_PCD_TYPE: &str = "semaphore-signature-pcd";

/// Separator between trapdoor and nullifier when deriving the signing seed.
pub const SEED_SEPARATOR: u8 = 0x00;
