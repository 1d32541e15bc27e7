//! Outbound delivery to a chat service.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use super::NotifyError;

/// Default Telegram Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Delivers one message to one target.
///
/// Mirrors the way the git backend is abstracted: production code uses
/// [`TelegramGateway`], tests substitute recording or failing gateways.
pub trait NotifierGateway: Send + Sync + 'static {
    fn send(
        &self,
        target: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

/// Telegram Bot API `sendMessage` client.
#[derive(Clone)]
pub struct TelegramGateway {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl std::fmt::Debug for TelegramGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramGateway")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl TelegramGateway {
    /// Builds a gateway whose HTTP client gives up after `timeout`.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(TelegramGateway {
            client,
            token: token.into(),
            api_base: TELEGRAM_API_BASE.to_string(),
        })
    }

    /// Points the gateway at a different API host (self-hosted Bot API server, tests).
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

impl NotifierGateway for TelegramGateway {
    async fn send(&self, target: &str, text: &str) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: target,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Http(e.without_url()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body: body.replace(&self.token, crate::types::REDACTED),
        })
    }
}

/// Gateway used when no bot token is configured: messages are logged, not sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOnlyGateway;

impl NotifierGateway for LogOnlyGateway {
    async fn send(&self, target: &str, text: &str) -> Result<(), NotifyError> {
        info!(target_id = %target, text = %text, "notification not sent (no gateway configured)");
        Ok(())
    }
}
