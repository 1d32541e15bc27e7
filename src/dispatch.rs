//! Webhook dispatch: verify, filter, sync, notify.
//!
//! [`Dispatcher::dispatch`] is the whole request policy. The HTTP layer only
//! extracts headers and the raw body into an [`InboundWebhook`] and renders
//! the returned [`DispatchResponse`].

use axum::Json;
use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::git::GitBackend;
use crate::notify::{Notify, failure_message, update_message};
use crate::sync::Synchronizer;
use crate::types::{RemoteCredential, RepositoryHandle, UpdateOutcome};
use crate::webhooks::{PUSH_EVENT, parse_event, verify};

/// Per-process dispatch configuration.
#[derive(Clone)]
pub struct DispatchConfig {
    /// Tracked branch name, without `refs/heads/`.
    pub branch: String,
    pub repository: RepositoryHandle,
    pub credential: RemoteCredential,
    /// HMAC key for `X-Hub-Signature-256`.
    pub webhook_secret: Vec<u8>,
    /// Also notify when a sync fails.
    pub notify_on_failure: bool,
}

impl std::fmt::Debug for DispatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchConfig")
            .field("branch", &self.branch)
            .field("repository", &self.repository)
            .field("credential", &self.credential)
            .field("notify_on_failure", &self.notify_on_failure)
            .finish_non_exhaustive()
    }
}

/// One delivery as received over HTTP.
#[derive(Debug, Clone, Default)]
pub struct InboundWebhook {
    /// `X-GitHub-Event`.
    pub event_type: Option<String>,
    /// `X-Hub-Signature-256`.
    pub signature: Option<String>,
    /// Raw request body, exactly as signed.
    pub body: Bytes,
}

/// Status and message returned to the webhook sender.
///
/// Rendered as JSON `{"message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: StatusCode,
    pub message: String,
}

impl DispatchResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        DispatchResponse {
            status,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }
}

impl IntoResponse for DispatchResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

/// Sequences signature check, filters, synchronizer and notifier.
pub struct Dispatcher<B, N> {
    config: DispatchConfig,
    synchronizer: Synchronizer<B>,
    notifier: N,
}

impl<B: GitBackend, N: Notify> Dispatcher<B, N> {
    pub fn new(config: DispatchConfig, synchronizer: Synchronizer<B>, notifier: N) -> Self {
        Dispatcher {
            config,
            synchronizer,
            notifier,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn synchronizer(&self) -> &Synchronizer<B> {
        &self.synchronizer
    }

    /// Handles one delivery.
    ///
    /// The signature is checked over the raw body before anything else is
    /// looked at; a bad signature touches neither the repository nor the
    /// notifier.
    pub async fn dispatch(&self, request: InboundWebhook) -> DispatchResponse {
        let event_type = request.event_type.as_deref().unwrap_or_default();
        debug!(event_type, "Received webhook");

        if !verify(
            &self.config.webhook_secret,
            &request.body,
            request.signature.as_deref(),
        ) {
            warn!(event_type, "Invalid webhook signature");
            return DispatchResponse::new(StatusCode::UNAUTHORIZED, "Invalid signature");
        }

        if event_type != PUSH_EVENT {
            debug!(event_type, "Ignoring non-push event");
            return DispatchResponse::ok("Only push events are processed");
        }

        let event = match parse_event(event_type, &request.body) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Malformed push payload");
                return DispatchResponse::new(StatusCode::BAD_REQUEST, "Invalid JSON payload");
            }
        };

        let branch = self.config.branch.as_str();
        if !event.targets_branch(branch) {
            debug!(target_ref = %event.target_ref, branch, "Ignoring push to other ref");
            return DispatchResponse::ok(format!(
                "Push to {} ignored, only {} is processed",
                event.target_ref, branch
            ));
        }

        let outcome = self
            .synchronizer
            .sync(&self.config.repository, &self.config.credential, branch)
            .await;

        let slug = self.config.credential.slug();
        match outcome {
            UpdateOutcome::Updated(tip) => {
                self.notifier
                    .notify(update_message(slug, branch, &tip, event.head_commit()));
                DispatchResponse::ok(format!("Updated to {}", tip.short()))
            }
            UpdateOutcome::AlreadyCurrent => DispatchResponse::ok("Already up-to-date"),
            UpdateOutcome::Failed(failure) => {
                if self.config.notify_on_failure {
                    info!(kind = ?failure.kind, "Sending failure notification");
                    self.notifier
                        .notify(failure_message(slug, branch, &failure));
                }
                DispatchResponse::new(StatusCode::INTERNAL_SERVER_ERROR, failure.reason)
            }
        }
    }
}
