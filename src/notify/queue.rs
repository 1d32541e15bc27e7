//! Bounded background delivery queue.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Notify, NotifierGateway, NotifyError};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery configuration for the queue worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    /// Chat ids; every message goes to each of them in order.
    pub targets: Vec<String>,
    /// Bound on a single gateway call.
    pub timeout: Duration,
    /// Messages that may wait for delivery before new ones are dropped.
    pub capacity: usize,
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            targets: Vec::new(),
            timeout: DEFAULT_NOTIFY_TIMEOUT,
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Sending half of the notification queue.
///
/// Cloning is cheap; all clones feed the same worker.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<String>,
}

impl NotificationQueue {
    /// Starts the delivery worker and returns the queue feeding it.
    ///
    /// The worker exits once `cancel` fires and the messages already queued
    /// have been delivered, or when every queue handle has been dropped.
    pub fn spawn<G: NotifierGateway>(
        gateway: G,
        settings: NotifySettings,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (queue, rx) = Self::channel(settings.capacity);
        let handle = tokio::spawn(run_worker(gateway, settings, rx, cancel));
        (queue, handle)
    }

    fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (NotificationQueue { tx }, rx)
    }
}

impl Notify for NotificationQueue {
    fn notify(&self, text: String) {
        match self.tx.try_send(text) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Notification queue full, dropping message");
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Notification worker has stopped, dropping message");
            }
        }
    }
}

async fn run_worker<G: NotifierGateway>(
    gateway: G,
    settings: NotifySettings,
    mut rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
) {
    debug!(targets = settings.targets.len(), "Notification worker started");

    loop {
        let text = tokio::select! {
            biased;

            received = rx.recv() => match received {
                Some(text) => text,
                None => break,
            },
            _ = cancel.cancelled() => break,
        };
        deliver(&gateway, &settings, &text).await;
    }

    // Flush whatever was accepted before shutdown.
    rx.close();
    while let Ok(text) = rx.try_recv() {
        deliver(&gateway, &settings, &text).await;
    }

    debug!("Notification worker stopped");
}

async fn deliver<G: NotifierGateway>(gateway: &G, settings: &NotifySettings, text: &str) {
    if settings.targets.is_empty() {
        info!("No notification targets configured, dropping message");
        return;
    }

    for target in &settings.targets {
        let result = match tokio::time::timeout(settings.timeout, gateway.send(target, text)).await
        {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(settings.timeout)),
        };

        match result {
            Ok(()) => debug!(target_id = %target, "Notification delivered"),
            Err(e) => warn!(target_id = %target, error = %e, "Failed to deliver notification"),
        }
    }
}
