//! Credential issuance
//!
//! `SignatureIssuer` derives the signing key from the identity once, caches it
//! for the process lifetime, and signs a fresh timestamped credential on every
//! `issue()` call. Credentials themselves are never cached: whether the claim
//! endpoint tolerates replaying one inside its validity window is unknown, so
//! each attempt gets its own.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ed25519_dalek::{Signer, SigningKey};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::credential::{Credential, SignatureClaim, SignaturePcd, SignatureProof, SignedPayload};
use crate::error::{Error, Result};
use crate::identity::{Identity, commitment_for};

/// Source of request-scoped credentials, shared by every feed scheduler.
///
/// Uses `Pin<Box<dyn Future>>` return types so schedulers can hold an
/// `Arc<dyn CredentialIssuer>`.
pub trait CredentialIssuer: Send + Sync {
    /// Initialise expensive signing material before the first claim.
    ///
    /// Errors here are fatal. The default does nothing.
    fn prepare(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async { Ok(()) })
    }

    /// Produce a fresh credential for exactly one claim request.
    fn issue(&self) -> Pin<Box<dyn Future<Output = Result<Credential>> + Send + '_>>;
}

/// Signing key and its encoded public half, derived once per identity.
struct SigningMaterial {
    key: SigningKey,
    public_key: String,
}

/// Ed25519 credential issuer bound to one identity.
pub struct SignatureIssuer {
    identity: Arc<Identity>,
    material: OnceCell<SigningMaterial>,
}

impl SignatureIssuer {
    pub fn new(identity: Arc<Identity>) -> Self {
        Self {
            identity,
            material: OnceCell::new(),
        }
    }

    /// The identity this issuer signs for.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Sign a credential for an explicit timestamp.
    pub async fn issue_at(&self, timestamp_ms: u64) -> Result<Credential> {
        let material = self.material().await?;

        let signed_message = serde_json::to_string(&SignedPayload {
            timestamp: timestamp_ms,
        })
        .map_err(|e| Error::Encoding(format!("serializing signed message: {e}")))?;
        let signature = material.key.sign(signed_message.as_bytes());

        let pcd = SignaturePcd {
            id: uuid::Uuid::new_v4().to_string(),
            claim: SignatureClaim {
                identity_commitment: self.identity.commitment().to_string(),
                signed_message,
            },
            proof: SignatureProof {
                public_key: material.public_key.clone(),
                signature: STANDARD.encode(signature.to_bytes()),
            },
        };
        debug!(credential_id = %pcd.id, timestamp_ms, "issued credential");
        Credential::wrap(&pcd)
    }

    /// Single-flight access to the cached signing material.
    ///
    /// Concurrent first callers all await the same initialisation.
    async fn material(&self) -> Result<&SigningMaterial> {
        self.material
            .get_or_try_init(|| async {
                let key = self.identity.signing_key();
                if commitment_for(&key) != self.identity.commitment() {
                    return Err(Error::Signing(
                        "derived key does not match identity commitment".into(),
                    ));
                }
                let public_key = STANDARD.encode(key.verifying_key().to_bytes());
                info!(commitment = %self.identity.commitment(), "signing material initialised");
                Ok(SigningMaterial { key, public_key })
            })
            .await
    }
}

impl CredentialIssuer for SignatureIssuer {
    fn prepare(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.material().await.map(|_| ()) })
    }

    fn issue(&self) -> Pin<Box<dyn Future<Output = Result<Credential>> + Send + '_>> {
        Box::pin(async move {
            let now_ms = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| Error::Signing(format!("system clock before unix epoch: {e}")))?
                .as_millis() as u64;
            self.issue_at(now_ms).await
        })
    }
}
