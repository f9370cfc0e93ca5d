//! Scripted issuers and claimers for scheduler and engine tests

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use frog_auth::{Credential, CredentialIssuer, SIGNATURE_PCD_TYPE};
use tokio::time::Instant;

use crate::claim::Claimer;
use crate::feed::{Feed, Outcome, epoch_millis};

/// Issuer that hands out a placeholder credential and counts calls.
#[derive(Default)]
pub struct StaticIssuer {
    pub issued: AtomicUsize,
}

impl CredentialIssuer for StaticIssuer {
    fn issue(&self) -> Pin<Box<dyn Future<Output = frog_auth::Result<Credential>> + Send + '_>> {
        self.issued.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Ok(Credential {
                pcd_type: SIGNATURE_PCD_TYPE.to_string(),
                pcd: "{}".to_string(),
            })
        })
    }
}

/// Issuer whose preparation or issuance fails.
pub struct BrokenIssuer {
    pub fail_prepare: bool,
}

impl CredentialIssuer for BrokenIssuer {
    fn prepare(&self) -> Pin<Box<dyn Future<Output = frog_auth::Result<()>> + Send + '_>> {
        let fail = self.fail_prepare;
        Box::pin(async move {
            if fail {
                Err(frog_auth::Error::MalformedIdentity("test identity".into()))
            } else {
                Ok(())
            }
        })
    }

    fn issue(&self) -> Pin<Box<dyn Future<Output = frog_auth::Result<Credential>> + Send + '_>> {
        Box::pin(async { Err(frog_auth::Error::Signing("signer offline".into())) })
    }
}

/// Issuer whose `issue()` never completes.
pub struct StalledIssuer;

impl CredentialIssuer for StalledIssuer {
    fn issue(&self) -> Pin<Box<dyn Future<Output = frog_auth::Result<Credential>> + Send + '_>> {
        Box::pin(std::future::pending())
    }
}

/// Claimer whose claims never complete. Counts the claims started.
#[derive(Default)]
pub struct StalledClaimer {
    pub started: AtomicUsize,
}

impl Claimer for StalledClaimer {
    fn claim<'a>(
        &'a self,
        _feed: &'a Feed,
        _credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        Box::pin(std::future::pending())
    }
}

/// What a scripted claim answers.
#[derive(Debug, Clone)]
pub enum Scripted {
    Success,
    /// Cooldown ending this many ms after the claim
    CooldownIn(u64),
    Error(&'static str),
}

impl Scripted {
    fn to_outcome(&self) -> Outcome {
        match self {
            Scripted::Success => Outcome::Success {
                body: r#"{"frogs":[]}"#.into(),
            },
            Scripted::CooldownIn(ms) => Outcome::Cooldown {
                until_ms: epoch_millis() + ms,
            },
            Scripted::Error(raw) => Outcome::Error {
                raw: (*raw).to_string(),
            },
        }
    }
}

/// Claimer answering from a per-feed script, then repeating a fallback.
/// Records the (tokio) instant of every attempt per feed id.
pub struct ScriptedClaimer {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallback: Scripted,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ScriptedClaimer {
    pub fn new(fallback: Scripted) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            fallback,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn script(self, feed_id: &str, answers: Vec<Scripted>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(feed_id.to_string(), answers.into());
        self
    }

    pub fn attempts(&self, feed_id: &str) -> Vec<Instant> {
        self.attempts
            .lock()
            .unwrap()
            .get(feed_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Claimer for ScriptedClaimer {
    fn claim<'a>(
        &'a self,
        feed: &'a Feed,
        _credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
        self.attempts
            .lock()
            .unwrap()
            .entry(feed.id.clone())
            .or_default()
            .push(Instant::now());
        let answer = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&feed.id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| self.fallback.clone());
        let outcome = answer.to_outcome();
        Box::pin(async move { outcome })
    }
}
