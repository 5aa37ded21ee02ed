//! HTTP surface
//!
//! Endpoints:
//! - `GET /` — daemon banner
//! - `GET|POST /im-alive/:token` — the liveness signal entry point
//! - `GET /api/v1/status` — per-app liveness snapshot
//!
//! Signal acceptance is independent of notification delivery: a 200 here
//! says only that the token matched and the signal was recorded.

use crate::registry::{SignalOutcome, WatcherRegistry};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Banner served at the root path.
const BANNER: &str = "vigil - the dead man's switch monitoring daemon\n";

/// Build the full router over a shared registry.
pub fn create_app(registry: Arc<WatcherRegistry>) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/im-alive/:token",
            get(handle_live_sign).post(handle_live_sign),
        )
        .route("/api/v1/status", get(get_status))
        .with_state(registry)
}

async fn index() -> &'static str {
    BANNER
}

/// Accept a liveness signal authenticated by its secret token.
async fn handle_live_sign(
    State(registry): State<Arc<WatcherRegistry>>,
    Path(token): Path<String>,
) -> (StatusCode, &'static str) {
    match registry.handle_live_sign(&token) {
        SignalOutcome::Accepted => (StatusCode::OK, "Got it. Waiting 'till you die.\n"),
        SignalOutcome::UnknownToken => (StatusCode::NOT_FOUND, "Unknown token.\n"),
    }
}

/// One app's liveness state in the status response.
#[derive(Debug, Serialize)]
struct AppStatus {
    name: String,
    state: &'static str,
    last_live_sign: String,
    seconds_since_last_sign: u64,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    apps: Vec<AppStatus>,
}

/// Informational liveness snapshot of every watched app.
async fn get_status(State(registry): State<Arc<WatcherRegistry>>) -> Json<StatusResponse> {
    let apps = registry
        .statuses()
        .into_iter()
        .map(|s| AppStatus {
            name: s.app,
            state: if s.alive { "alive" } else { "dead" },
            last_live_sign: s.last_live_sign.to_rfc3339(),
            seconds_since_last_sign: s.since_last_sign.as_secs(),
        })
        .collect();
    Json(StatusResponse { apps })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_registry() -> Arc<WatcherRegistry> {
        let config: crate::config::Config = toml::from_str(
            r#"
[[apps]]
name = "cron-job"
token = "cron-secret"
timeout = "30s"
repeat_interval = "10s"
"#,
        )
        .unwrap();
        Arc::new(WatcherRegistry::build(&config, &[]).unwrap())
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn index_serves_banner() {
        let app = create_app(test_registry());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("vigil"));
    }

    #[tokio::test]
    async fn live_sign_with_valid_token_returns_200() {
        let app = create_app(test_registry());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/im-alive/cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Got it"));
    }

    #[tokio::test]
    async fn live_sign_accepts_post() {
        let app = create_app(test_registry());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/im-alive/cron-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn live_sign_with_unknown_token_returns_404() {
        let app = create_app(test_registry());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/im-alive/wrong-secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("Unknown token"));
    }

    #[tokio::test]
    async fn status_reports_every_app() {
        let app = create_app(test_registry());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["apps"][0]["name"], "cron-job");
        assert_eq!(json["apps"][0]["state"], "alive");
    }
}
