//! Claim endpoint defaults and pacing constants
//!
//! Defaults match the upstream web client. All of them can be overridden from
//! the harvester configuration.

use std::time::Duration;

/// Feed claim endpoint (one POST per attempt)
pub const CLAIM_ENDPOINT: &str = "https://api.getfrogs.xyz/frogcrypto/feeds";

/// `origin` header the endpoint expects from its web client
pub const CLIENT_ORIGIN: &str = "https://zupass.org";

/// `referer` header the endpoint expects from its web client
pub const CLIENT_REFERER: &str = "https://zupass.org/";

/// Default `user-agent`
pub const USER_AGENT: &str = concat!("frog-harvester/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Text the endpoint puts in front of the next eligible epoch-ms timestamp.
pub const COOLDOWN_MARKER: &str = "Next fetch available at";

/// Assumed cooldown when the marker is present but its timestamp is unreadable.
pub const UNREADABLE_COOLDOWN: Duration = Duration::from_secs(60);

/// Delay after a successful claim: re-poll quickly to learn the next window.
pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_millis(1_000);

/// Delay after an unclassified error.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_millis(60_000);

/// Feeds polled when the configuration lists none, as (name, id).
pub const DEFAULT_FEEDS: &[(&str, &str)] = &[
    ("Swamp", "7d27baf6-c568-4069-92c7-fc5daae854f6"),
    ("Celestial Pond", "0a9a51b8-8598-4e35-b1c5-1564f0cdbea5"),
    ("The Writhing Void", "965df833-c85f-4ea4-8998-ae7c429c5803"),
    ("Desert", "c097db01-ff2a-46d8-82cb-a3873a4db3f0"),
    ("Jungle", "8d1f0008-c63b-4cdf-9c23-d86ecf0f5729"),
    ("The Capital", "47761bc0-0509-4f36-a2c6-4f9f27b34a30"),
];
