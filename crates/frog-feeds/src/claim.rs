//! Claim requests and response classification
//!
//! One claim is one POST of `{feedId, pcd}` to the claim endpoint. The
//! response is folded into exactly one `Outcome`:
//!
//! 1. 2xx → `Success`, whatever the body says
//! 2. body carries the cooldown notice → `Cooldown`
//! 3. anything else, including transport failures → `Error`
//!
//! The endpoint only reports cooldowns inside its error text
//! (`"Next fetch available at <epoch ms>"`), so `parse_cooldown_notice` is a
//! compatibility shim over that text rather than a schema decoder.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use frog_auth::Credential;
use reqwest::header::{
    ACCEPT, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderValue, ORIGIN, PRAGMA, REFERER,
    USER_AGENT,
};
use serde::Serialize;
use tracing::debug;

use crate::constants::{
    CLAIM_ENDPOINT, CLIENT_ORIGIN, CLIENT_REFERER, COOLDOWN_MARKER, DEFAULT_TIMEOUT,
    UNREADABLE_COOLDOWN,
};
use crate::error::{Error, Result};
use crate::feed::{Feed, Outcome, epoch_millis};

/// Executes one claim attempt and classifies the response.
///
/// Implementations must not fail: every problem becomes `Outcome::Error`.
pub trait Claimer: Send + Sync {
    fn claim<'a>(
        &'a self,
        feed: &'a Feed,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;
}

/// Where and how claims are sent.
#[derive(Debug, Clone)]
pub struct ClaimEndpoint {
    pub url: String,
    pub origin: String,
    pub referer: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClaimEndpoint {
    fn default() -> Self {
        Self {
            url: CLAIM_ENDPOINT.to_string(),
            origin: CLIENT_ORIGIN.to_string(),
            referer: CLIENT_REFERER.to_string(),
            user_agent: crate::constants::USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Parsed cooldown notice from an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownNotice {
    /// Next eligible time, epoch milliseconds
    At(u64),
    /// Marker present but the trailing timestamp could not be read
    Unreadable,
}

/// Look for the cooldown marker and read the timestamp after it.
///
/// The timestamp is the leading run of digits in the last whitespace-delimited
/// token after the marker. Leading quotes are skipped and anything after the
/// digits is ignored, since the body is often JSON wrapping the message.
pub fn parse_cooldown_notice(body: &str) -> Option<CooldownNotice> {
    let start = body.find(COOLDOWN_MARKER)?;
    let tail = &body[start + COOLDOWN_MARKER.len()..];

    let notice = tail
        .split_whitespace()
        .last()
        .map(|token| token.trim_start_matches(['"', '\'']))
        .map(|token| {
            let end = token
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(token.len());
            &token[..end]
        })
        .filter(|digits| !digits.is_empty())
        .and_then(|digits| digits.parse::<u64>().ok())
        .map_or(CooldownNotice::Unreadable, CooldownNotice::At);
    Some(notice)
}

/// Classify an HTTP response. `now_ms` anchors the unreadable-cooldown fallback.
pub fn classify_response(status: u16, body: String, now_ms: u64) -> Outcome {
    if (200..300).contains(&status) {
        return Outcome::Success { body };
    }

    match parse_cooldown_notice(&body) {
        Some(CooldownNotice::At(until_ms)) => Outcome::Cooldown { until_ms },
        Some(CooldownNotice::Unreadable) => Outcome::Cooldown {
            until_ms: now_ms.saturating_add(UNREADABLE_COOLDOWN.as_millis() as u64),
        },
        None => Outcome::Error {
            raw: format!("HTTP {status}: {body}"),
        },
    }
}

/// Claim request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest<'a> {
    feed_id: &'a str,
    pcd: &'a Credential,
}

/// Claimer that talks to the real endpoint over HTTP.
pub struct HttpClaimer {
    client: reqwest::Client,
    url: String,
    headers: HeaderMap,
    timeout: Duration,
}

impl HttpClaimer {
    /// Build a claimer, validating the configured header values up front.
    pub fn new(client: reqwest::Client, endpoint: &ClaimEndpoint) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(ORIGIN, header_value("origin", &endpoint.origin)?);
        headers.insert(REFERER, header_value("referer", &endpoint.referer)?);
        headers.insert(USER_AGENT, header_value("user-agent", &endpoint.user_agent)?);

        Ok(Self {
            client,
            url: endpoint.url.clone(),
            headers,
            timeout: endpoint.timeout,
        })
    }

    async fn post_claim(&self, feed: &Feed, credential: Credential) -> Outcome {
        let body = ClaimRequest {
            feed_id: &feed.id,
            pcd: &credential,
        };

        let response = match self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return Outcome::Error {
                    raw: format!("claim request failed: {e}"),
                };
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                return Outcome::Error {
                    raw: format!("reading claim response ({status}) failed: {e}"),
                };
            }
        };
        debug!(feed = %feed.name, status = status.as_u16(), bytes = text.len(), "claim response received");

        classify_response(status.as_u16(), text, epoch_millis())
    }
}

impl Claimer for HttpClaimer {
    fn claim<'a>(
        &'a self,
        feed: &'a Feed,
        credential: Credential,
    ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
        Box::pin(self.post_claim(feed, credential))
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::Endpoint(format!("invalid {name} header value {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use tokio::net::TcpListener;

    const NOW: u64 = 1_699_999_990_000;

    #[test]
    fn success_ignores_body() {
        assert_eq!(
            classify_response(200, "Next fetch available at 1".into(), NOW),
            Outcome::Success {
                body: "Next fetch available at 1".into()
            }
        );
        assert_eq!(
            classify_response(201, String::new(), NOW).kind(),
            crate::OutcomeKind::Success
        );
    }

    #[test]
    fn cooldown_marker_yields_timestamp() {
        let outcome = classify_response(
            403,
            "Frog faucet off. Next fetch available at 1700000000000".into(),
            NOW,
        );
        assert_eq!(
            outcome,
            Outcome::Cooldown {
                until_ms: 1_700_000_000_000
            }
        );
    }

    #[test]
    fn cooldown_marker_inside_json_string() {
        let body = r#""Next fetch available at 1700000000000""#;
        assert_eq!(
            parse_cooldown_notice(body),
            Some(CooldownNotice::At(1_700_000_000_000))
        );
    }

    #[test]
    fn cooldown_marker_inside_json_object() {
        let body = r#"{"error":"Next fetch available at 1700000000000"}"#;
        assert_eq!(
            parse_cooldown_notice(body),
            Some(CooldownNotice::At(1_700_000_000_000))
        );
        assert_eq!(
            classify_response(403, body.into(), NOW),
            Outcome::Cooldown {
                until_ms: 1_700_000_000_000
            }
        );
    }

    #[test]
    fn trailing_punctuation_after_timestamp_is_ignored() {
        for body in [
            "Next fetch available at 1700000000000)",
            "Next fetch available at 1700000000000.",
            "Next fetch available at 1700000000000ms",
        ] {
            assert_eq!(
                parse_cooldown_notice(body),
                Some(CooldownNotice::At(1_700_000_000_000)),
                "body: {body}"
            );
        }
    }

    #[test]
    fn oversized_timestamp_is_unreadable() {
        assert_eq!(
            parse_cooldown_notice("Next fetch available at 99999999999999999999999"),
            Some(CooldownNotice::Unreadable)
        );
    }

    #[test]
    fn unreadable_timestamp_falls_back_to_one_minute() {
        let outcome = classify_response(403, "Next fetch available at soon".into(), NOW);
        assert_eq!(
            outcome,
            Outcome::Cooldown {
                until_ms: NOW + 60_000
            }
        );
    }

    #[test]
    fn marker_without_token_is_unreadable() {
        assert_eq!(
            parse_cooldown_notice("Next fetch available at"),
            Some(CooldownNotice::Unreadable)
        );
    }

    #[test]
    fn negative_timestamp_is_unreadable() {
        assert_eq!(
            parse_cooldown_notice("Next fetch available at -5"),
            Some(CooldownNotice::Unreadable)
        );
    }

    #[test]
    fn no_marker_is_error_with_raw_body() {
        let outcome = classify_response(500, "internal server error".into(), NOW);
        assert_eq!(
            outcome,
            Outcome::Error {
                raw: "HTTP 500: internal server error".into()
            }
        );
    }

    #[test]
    fn empty_error_body_is_error() {
        assert_eq!(
            classify_response(401, String::new(), NOW).kind(),
            crate::OutcomeKind::Error
        );
    }

    #[test]
    fn claim_body_shape() {
        let credential = Credential {
            pcd_type: "semaphore-signature-pcd".into(),
            pcd: "{}".into(),
        };
        let body = ClaimRequest {
            feed_id: "id-a",
            pcd: &credential,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["feedId"], "id-a");
        assert_eq!(json["pcd"]["type"], "semaphore-signature-pcd");
    }

    #[test]
    fn rejects_unencodable_header() {
        let endpoint = ClaimEndpoint {
            user_agent: "bad\nagent".into(),
            ..ClaimEndpoint::default()
        };
        let result = HttpClaimer::new(reqwest::Client::new(), &endpoint);
        assert!(matches!(result, Err(Error::Endpoint(_))));
    }

    /// Fake claim endpoint: answers by feed id and insists on the web client headers.
    async fn start_claim_server() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = format!("http://{addr}/frogcrypto/feeds");

        let handle = tokio::spawn(async move {
            let app = axum::Router::new().route(
                "/frogcrypto/feeds",
                axum::routing::post(
                    |headers: AxumHeaders, Json(body): Json<serde_json::Value>| async move {
                        if headers.get("origin").map(|v| v.as_bytes()) != Some(b"https://zupass.org")
                            || body["pcd"]["type"] != "semaphore-signature-pcd"
                        {
                            return (StatusCode::BAD_REQUEST, "bad request".to_string());
                        }
                        match body["feedId"].as_str() {
                            Some("id-ok") => (StatusCode::OK, r#"{"frogs":[{}]}"#.to_string()),
                            Some("id-cool") => (
                                StatusCode::FORBIDDEN,
                                "Next fetch available at 1700000000000".to_string(),
                            ),
                            _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
                        }
                    },
                ),
            );
            axum::serve(listener, app).await.unwrap();
        });

        (url, handle)
    }

    fn claimer_for(url: &str) -> HttpClaimer {
        let endpoint = ClaimEndpoint {
            url: url.to_string(),
            timeout: Duration::from_secs(5),
            ..ClaimEndpoint::default()
        };
        HttpClaimer::new(reqwest::Client::new(), &endpoint).unwrap()
    }

    fn credential() -> Credential {
        Credential {
            pcd_type: "semaphore-signature-pcd".into(),
            pcd: "{}".into(),
        }
    }

    #[tokio::test]
    async fn http_claim_success() {
        let (url, server) = start_claim_server().await;
        let feed = Feed::new("Swamp", "id-ok");
        let outcome = claimer_for(&url).claim(&feed, credential()).await;
        assert_eq!(
            outcome,
            Outcome::Success {
                body: r#"{"frogs":[{}]}"#.into()
            }
        );
        server.abort();
    }

    #[tokio::test]
    async fn http_claim_cooldown() {
        let (url, server) = start_claim_server().await;
        let feed = Feed::new("Desert", "id-cool");
        let outcome = claimer_for(&url).claim(&feed, credential()).await;
        assert_eq!(
            outcome,
            Outcome::Cooldown {
                until_ms: 1_700_000_000_000
            }
        );
        server.abort();
    }

    #[tokio::test]
    async fn http_claim_server_error() {
        let (url, server) = start_claim_server().await;
        let feed = Feed::new("Jungle", "id-unknown");
        let outcome = claimer_for(&url).claim(&feed, credential()).await;
        assert_eq!(
            outcome,
            Outcome::Error {
                raw: "HTTP 500: boom".into()
            }
        );
        server.abort();
    }

    #[tokio::test]
    async fn connection_refused_becomes_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let feed = Feed::new("Swamp", "id-ok");
        let outcome = claimer_for(&format!("http://{addr}/frogcrypto/feeds"))
            .claim(&feed, credential())
            .await;
        match outcome {
            Outcome::Error { raw } => assert!(raw.contains("claim request failed"), "got: {raw}"),
            other => panic!("expected Error, got {other:?}"),
        }
    }
}
