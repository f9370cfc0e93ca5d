//! Per-feed claim scheduling
//!
//! Runs one independent polling loop per frog feed. Each cycle issues a fresh
//! credential, posts one claim, classifies the response, and sleeps for the
//! delay the cooldown policy derives from it. Feeds share the identity and
//! credential issuer but never each other's timing.
//!
//! Cycle per feed:
//! 1. `Idle`: pass the (optional) cross-feed admission gate
//! 2. `Requesting`: `CredentialIssuer::issue()` then `Claimer::claim()`
//! 3. `Classifying`: `CooldownPolicy::next_delay()` on the outcome
//! 4. `Sleeping`: wait out the delay, then back to 1
//!
//! Every suspension point also watches the engine's cancellation token.

pub mod claim;
pub mod constants;
pub mod cooldown;
pub mod engine;
pub mod error;
pub mod feed;
pub mod gate;
pub mod metrics;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod test_support;

pub use claim::{
    ClaimEndpoint, Claimer, CooldownNotice, HttpClaimer, classify_response, parse_cooldown_notice,
};
pub use cooldown::CooldownPolicy;
pub use engine::Engine;
pub use error::{Error, Result};
pub use feed::{Feed, Outcome, OutcomeKind, epoch_millis};
pub use gate::AdmissionGate;
pub use scheduler::{FeedPhase, FeedScheduler, FeedStatus, SchedulerDeps};
