use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use branch_sync::config::{AppConfig, Cli};
use branch_sync::dispatch::Dispatcher;
use branch_sync::git::CliGit;
use branch_sync::notify::{LogOnlyGateway, NotificationQueue, TelegramGateway};
use branch_sync::server::{AppState, build_router};
use branch_sync::sync::Synchronizer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "branch_sync=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_cli(Cli::parse()).context("invalid configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let shutdown = CancellationToken::new();
    let (notifier, notify_task) = match &config.telegram_token {
        Some(token) => {
            let gateway = TelegramGateway::new(token.as_str(), config.notify.timeout)
                .context("failed to build Telegram client")?;
            NotificationQueue::spawn(gateway, config.notify.clone(), shutdown.clone())
        }
        None => {
            tracing::warn!("TELEGRAM_TOKEN not set, notifications will only be logged");
            NotificationQueue::spawn(LogOnlyGateway, config.notify.clone(), shutdown.clone())
        }
    };

    let synchronizer = Synchronizer::new(CliGit::new(), config.sync);
    let dispatcher = Dispatcher::new(config.dispatch.clone(), synchronizer, notifier);
    let app = build_router(AppState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    tracing::info!(
        addr = %config.listen,
        repo = %config.dispatch.repository.path().display(),
        branch = %config.dispatch.branch,
        policy = %config.sync.policy,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shutting down, flushing notifications");
    shutdown.cancel();
    if let Err(e) = notify_task.await {
        tracing::warn!(error = %e, "notification worker panicked");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
