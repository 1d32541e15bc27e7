//! HTTP server.
//!
//! # Endpoints
//!
//! - `POST /webhook` - GitHub push deliveries; verified, filtered and synced
//!   before the response is sent
//! - `GET /` - JSON banner
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod health;
pub mod webhook;

pub use health::{health_handler, root_handler};
pub use webhook::webhook_handler;

use crate::dispatch::Dispatcher;
use crate::git::GitBackend;
use crate::notify::Notify;

/// Shared application state.
///
/// Passed to handlers via Axum's `State` extractor. Generic over the git
/// backend and the notifier so tests can drive the full router with fakes.
pub struct AppState<B, N> {
    inner: Arc<Dispatcher<B, N>>,
}

// Derived `Clone` would require `B: Clone, N: Clone`.
impl<B, N> Clone for AppState<B, N> {
    fn clone(&self) -> Self {
        AppState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: GitBackend, N: Notify> AppState<B, N> {
    pub fn new(dispatcher: Dispatcher<B, N>) -> Self {
        AppState {
            inner: Arc::new(dispatcher),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<B, N> {
        &self.inner
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<B: GitBackend, N: Notify>(app_state: AppState<B, N>) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/", get(root_handler))
        .route("/webhook", post(webhook_handler::<B, N>))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::dispatch::DispatchConfig;
    use crate::git::UpdatePolicy;
    use crate::sync::{SyncSettings, Synchronizer};
    use crate::test_utils::{FakeBackend, FakeRepo, RecordingNotifier};
    use crate::types::{RemoteCredential, RepoSlug, RepositoryHandle};
    use crate::webhooks::expected_tag;

    const SECRET: &[u8] = b"router-secret";

    fn app(backend: FakeBackend) -> (axum::Router, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        let config = DispatchConfig {
            branch: "main".to_string(),
            repository: RepositoryHandle::new("/srv/app"),
            credential: RemoteCredential::new(
                "deploy",
                "ghp_router",
                RepoSlug::parse("octocat/hello").unwrap(),
            ),
            webhook_secret: SECRET.to_vec(),
            notify_on_failure: false,
        };
        let synchronizer = Synchronizer::new(
            backend,
            SyncSettings {
                policy: UpdatePolicy::FastForward,
                timeout: Duration::from_secs(5),
            },
        );
        let dispatcher = Dispatcher::new(config, synchronizer, notifier.clone());
        (build_router(AppState::new(dispatcher)), notifier)
    }

    fn webhook_request(event: &str, body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .header("x-github-event", event);
        if let Some(signature) = signature {
            builder = builder.header("x-hub-signature-256", signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signed_push_updates_repository() {
        let backend = FakeBackend::new(FakeRepo::new("abc123", "def456"));
        let (router, notifier) = app(backend.clone());

        let body = r#"{"ref":"refs/heads/main","commits":[{"message":"Ship it","author":{"name":"Mona"}}]}"#;
        let signature = expected_tag(SECRET, body.as_bytes());
        let response = router
            .oneshot(webhook_request("push", body, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Updated to def456" })
        );
        assert_eq!(backend.updates(), 1);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[tokio::test]
    async fn unsigned_request_is_unauthorized() {
        let backend = FakeBackend::new(FakeRepo::new("abc123", "def456"));
        let (router, notifier) = app(backend.clone());

        let response = router
            .oneshot(webhook_request("push", r#"{"ref":"refs/heads/main"}"#, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Invalid signature" })
        );
        assert_eq!(backend.calls(), 0);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn ping_event_is_acknowledged() {
        let backend = FakeBackend::new(FakeRepo::new("abc123", "def456"));
        let (router, _notifier) = app(backend.clone());

        let body = r#"{"zen":"Keep it logically awesome."}"#;
        let signature = expected_tag(SECRET, body.as_bytes());
        let response = router
            .oneshot(webhook_request("ping", body, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "Only push events are processed" })
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn failed_sync_is_server_error() {
        let mut repo = FakeRepo::new("abc123", "def456");
        repo.valid = false;
        let (router, _notifier) = app(FakeBackend::new(repo));

        let body = r#"{"ref":"refs/heads/main"}"#;
        let signature = expected_tag(SECRET, body.as_bytes());
        let response = router
            .oneshot(webhook_request("push", body, Some(signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "invalid repository path" })
        );
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let (router, _notifier) = app(FakeBackend::new(FakeRepo::new("abc123", "abc123")));

        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "message": "GitHub Webhook Receiver is running" })
        );

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"OK");
    }

    #[tokio::test]
    async fn health_answers_while_sync_is_running() {
        let backend = FakeBackend::with_delay(
            FakeRepo::new("abc123", "def456"),
            Duration::from_millis(200),
        );
        let (router, _notifier) = app(backend);

        let body = r#"{"ref":"refs/heads/main"}"#;
        let signature = expected_tag(SECRET, body.as_bytes());
        let sync = tokio::spawn(
            router
                .clone()
                .oneshot(webhook_request("push", body, Some(signature))),
        );

        let health = tokio::time::timeout(
            Duration::from_millis(100),
            router.oneshot(Request::get("/health").body(Body::empty()).unwrap()),
        )
        .await
        .expect("health check blocked behind sync")
        .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let response = sync.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState<FakeBackend, RecordingNotifier>>();
    }
}
