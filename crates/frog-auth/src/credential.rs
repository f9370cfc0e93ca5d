//! Signed credential wire format
//!
//! A credential is a serialized "PCD": an outer `{type, pcd}` envelope whose
//! `pcd` field is itself a JSON string. The inner document binds the identity
//! commitment to a timestamped message and carries an Ed25519 signature over
//! that exact message.
//!
//! The envelope matches the upstream one but the proof does not: upstream
//! carries a Semaphore proof where this carries `{publicKey, signature}`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::SIGNATURE_PCD_TYPE;
use crate::error::{Error, Result};

/// Serialized credential as embedded in a claim request body.
///
/// Opaque to the claimer beyond being serializable. Single-use: a new one is
/// issued for every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "type")]
    pub pcd_type: String,
    /// JSON-encoded [`SignaturePcd`]
    pub pcd: String,
}

/// Inner signature document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePcd {
    /// Random per-credential id (uuid v4)
    pub id: String,
    pub claim: SignatureClaim,
    pub proof: SignatureProof,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureClaim {
    pub identity_commitment: String,
    /// JSON `{"timestamp": <epoch ms>}`, signed byte-for-byte
    pub signed_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureProof {
    /// Base64 Ed25519 verifying key
    pub public_key: String,
    /// Base64 Ed25519 signature over `signed_message`
    pub signature: String,
}

/// Message body that gets signed.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SignedPayload {
    pub timestamp: u64,
}

impl Credential {
    /// Wrap a signature document in the outer envelope.
    pub fn wrap(pcd: &SignaturePcd) -> Result<Self> {
        let inner = serde_json::to_string(pcd)
            .map_err(|e| Error::Encoding(format!("serializing signature pcd: {e}")))?;
        Ok(Self {
            pcd_type: SIGNATURE_PCD_TYPE.to_string(),
            pcd: inner,
        })
    }

    /// Decode the inner signature document.
    pub fn decode(&self) -> Result<SignaturePcd> {
        if self.pcd_type != SIGNATURE_PCD_TYPE {
            return Err(Error::Encoding(format!(
                "unexpected credential type {:?}",
                self.pcd_type
            )));
        }
        serde_json::from_str(&self.pcd)
            .map_err(|e| Error::Encoding(format!("parsing signature pcd: {e}")))
    }
}

impl SignaturePcd {
    /// Timestamp embedded in the signed message.
    pub fn timestamp(&self) -> Result<u64> {
        let payload: SignedPayload = serde_json::from_str(&self.claim.signed_message)
            .map_err(|e| Error::Encoding(format!("parsing signed message: {e}")))?;
        Ok(payload.timestamp)
    }

    /// Check the signature and that the public key matches the claimed commitment.
    pub fn verify(&self) -> Result<()> {
        let key_bytes: [u8; 32] = STANDARD
            .decode(&self.proof.public_key)
            .map_err(|e| Error::Verification(format!("public key is not base64: {e}")))?
            .try_into()
            .map_err(|_| Error::Verification("public key must be 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&key_bytes)
            .map_err(|e| Error::Verification(format!("invalid public key: {e}")))?;

        if hex::encode(Sha256::digest(key.to_bytes())) != self.claim.identity_commitment {
            return Err(Error::Verification(
                "public key does not match identity commitment".into(),
            ));
        }

        let sig_bytes: [u8; 64] = STANDARD
            .decode(&self.proof.signature)
            .map_err(|e| Error::Verification(format!("signature is not base64: {e}")))?
            .try_into()
            .map_err(|_| Error::Verification("signature must be 64 bytes".into()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        key.verify(self.claim.signed_message.as_bytes(), &signature)
            .map_err(|e| Error::Verification(format!("bad signature: {e}")))
    }
}
