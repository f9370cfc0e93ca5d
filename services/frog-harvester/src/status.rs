//! Status listener: `/health` and `/metrics`

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use frog_feeds::Engine;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Status requests are cheap and rare; cap them so a scraper loop cannot pile up.
const MAX_STATUS_CONNECTIONS: usize = 64;

#[derive(Clone)]
pub struct StatusState {
    pub engine: Arc<Engine>,
    pub prometheus: PrometheusHandle,
}

pub fn build_router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(
            MAX_STATUS_CONNECTIONS,
        ))
        .with_state(state)
}

/// Engine and per-feed status as JSON. 503 once the engine has stopped.
async fn health_handler(State(state): State<StatusState>) -> impl IntoResponse {
    let body = state.engine.health().await;
    let status_code = if body["status"] == "running" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus text exposition.
async fn metrics_handler(State(state): State<StatusState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use frog_auth::{Credential, CredentialIssuer, SIGNATURE_PCD_TYPE};
    use frog_feeds::{
        AdmissionGate, Claimer, CooldownPolicy, Feed, Outcome, SchedulerDeps,
    };
    use std::future::Future;
    use std::pin::Pin;
    use tower::ServiceExt;

    struct NoopIssuer;

    impl CredentialIssuer for NoopIssuer {
        fn issue(&self) -> Pin<Box<dyn Future<Output = frog_auth::Result<Credential>> + Send + '_>> {
            Box::pin(async {
                Ok(Credential {
                    pcd_type: SIGNATURE_PCD_TYPE.to_string(),
                    pcd: "{}".to_string(),
                })
            })
        }
    }

    struct NoopClaimer;

    impl Claimer for NoopClaimer {
        fn claim<'a>(
            &'a self,
            _feed: &'a Feed,
            _credential: Credential,
        ) -> Pin<Box<dyn Future<Output = Outcome> + Send + 'a>> {
            Box::pin(async {
                Outcome::Success {
                    body: String::new(),
                }
            })
        }
    }

    fn test_state() -> StatusState {
        let deps = SchedulerDeps {
            issuer: Arc::new(NoopIssuer),
            claimer: Arc::new(NoopClaimer),
            policy: CooldownPolicy::default(),
            gate: Arc::new(AdmissionGate::disabled()),
        };
        let engine = Engine::new(vec![Feed::new("Swamp", "id-a")], deps).unwrap();
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        StatusState {
            engine: Arc::new(engine),
            prometheus: recorder.handle(),
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_lists_feeds() {
        let app = build_router(test_state());
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "running");
        assert_eq!(body["feeds_total"], 1);
        assert_eq!(body["feeds"][0]["name"], "Swamp");
        assert_eq!(body["feeds"][0]["id"], "id-a");
    }

    #[tokio::test]
    async fn health_is_unavailable_after_shutdown() {
        let state = test_state();
        state.engine.shutdown();
        let (status, body) = get_json(build_router(state), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "stopped");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = build_router(test_state());
        let response = app
            .oneshot(Request::get("/claim").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
