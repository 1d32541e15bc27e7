//! Best-effort chat notifications.
//!
//! The dispatcher hands finished messages to a [`Notify`] sink and moves on.
//! In production that sink is a [`NotificationQueue`]: a bounded channel
//! drained by one background task that delivers each message to every
//! configured target through a [`NotifierGateway`], with a timeout per call.
//! Delivery failures are logged and swallowed; they never reach the request
//! that produced the message.

pub mod format;
pub mod gateway;
pub mod queue;

use thiserror::Error;

pub use format::{failure_message, update_message};
pub use gateway::{LogOnlyGateway, NotifierGateway, TELEGRAM_API_BASE, TelegramGateway};
pub use queue::{DEFAULT_NOTIFY_TIMEOUT, DEFAULT_QUEUE_CAPACITY, NotificationQueue, NotifySettings};

/// Fire-and-forget message sink.
///
/// Implementations must return promptly; anything slow belongs behind a queue.
pub trait Notify: Send + Sync + 'static {
    fn notify(&self, text: String);
}

/// Errors from a single delivery attempt.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The HTTP client could not be built or the request failed in transit.
    ///
    /// The request URL is stripped before the error is stored, since the
    /// Telegram URL embeds the bot token.
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The gateway did not answer in time.
    #[error("notification timed out after {0:?}")]
    Timeout(std::time::Duration),
}
