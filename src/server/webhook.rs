//! Webhook endpoint handler.
//!
//! Collects the two GitHub headers and the raw body and hands them to the
//! [`Dispatcher`](crate::dispatch::Dispatcher). The body is taken as `Bytes`
//! so the signature is checked over exactly what was sent.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use super::AppState;
use crate::dispatch::{DispatchResponse, InboundWebhook};
use crate::git::GitBackend;
use crate::notify::Notify;

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Headers:
///   - `X-GitHub-Event`: only `push` is acted on
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Body: JSON push payload
///
/// # Response
///
/// JSON `{"message": ...}` with
///
/// - 200 OK: updated, already up-to-date, or skipped (other event or branch)
/// - 400 Bad Request: body is not a valid push payload
/// - 401 Unauthorized: missing or invalid signature
/// - 500 Internal Server Error: the sync failed
///
/// Missing headers are not errors on their own: a missing signature fails
/// verification and a missing event type is treated as a non-push event.
pub async fn webhook_handler<B: GitBackend, N: Notify>(
    State(app_state): State<AppState<B, N>>,
    headers: HeaderMap,
    body: Bytes,
) -> DispatchResponse {
    let request = InboundWebhook {
        event_type: get_header(&headers, HEADER_EVENT),
        signature: get_header(&headers, HEADER_SIGNATURE),
        body,
    };

    app_state.dispatcher().dispatch(request).await
}

/// Extracts a header value as a string, or `None` if absent or not UTF-8.
fn get_header(headers: &HeaderMap, name: &'static str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
