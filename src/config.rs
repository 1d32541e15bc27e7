//! Process configuration.
//!
//! Every setting can be given as a flag or through the environment variable
//! shown next to it. [`Cli`] is parsed once in `main` and converted into
//! [`AppConfig`]; nothing past that point reads the environment.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::BoolishValueParser;
use thiserror::Error;

use crate::dispatch::DispatchConfig;
use crate::git::UpdatePolicy;
use crate::notify::{DEFAULT_QUEUE_CAPACITY, NotifySettings};
use crate::sync::SyncSettings;
use crate::types::{DEFAULT_REMOTE_BASE, InvalidSlug, RemoteCredential, RepoSlug, RepositoryHandle};

/// Configuration errors detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid repository slug: {0}")]
    InvalidSlug(#[from] InvalidSlug),

    #[error("tracked branch name must not be empty")]
    EmptyBranch,

    #[error("access token must not be empty")]
    EmptyToken,
}

/// Command-line and environment settings.
#[derive(Parser)]
#[command(name = "branch-sync", version)]
#[command(about = "Keeps a local working copy in step with a GitHub branch, driven by push webhooks")]
pub struct Cli {
    /// Local working copy to keep updated
    #[arg(long, env = "GIT_REPO_PATH")]
    pub repo_path: PathBuf,

    /// Branch to track
    #[arg(long, env = "GIT_BRANCH", default_value = "master")]
    pub branch: String,

    /// Username for the authenticated remote URL
    #[arg(long, env = "GIT_USERNAME")]
    pub git_username: String,

    /// Personal access token used to fetch
    #[arg(long, env = "GIT_PAT", hide_env_values = true)]
    pub git_token: String,

    /// Repository as owner/name
    #[arg(long, env = "GIT_REPO_SLUG")]
    pub repo_slug: String,

    /// Remote host base URL
    #[arg(long, env = "GIT_REMOTE_BASE", default_value = DEFAULT_REMOTE_BASE)]
    pub remote_base: String,

    /// Webhook signing secret (defaults to the access token)
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,

    /// fast-forward or hard-reset
    #[arg(long, env = "GIT_UPDATE_POLICY", default_value = "fast-forward")]
    pub update_policy: UpdatePolicy,

    /// Upper bound on one sync, in seconds
    #[arg(long, env = "SYNC_TIMEOUT_SECS", default_value_t = 120)]
    pub sync_timeout_secs: u64,

    /// Telegram bot token; without it notifications are only logged
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true)]
    pub telegram_token: Option<String>,

    /// Comma-separated Telegram chat ids
    #[arg(long, env = "TELEGRAM_CHAT_ID", default_value = "")]
    pub telegram_chat_ids: String,

    /// Timeout for one notification call, in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = 10)]
    pub notify_timeout_secs: u64,

    /// Also notify when a sync fails
    #[arg(long, env = "NOTIFY_ON_FAILURE", value_parser = BoolishValueParser::new())]
    pub notify_on_failure: bool,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,
}

/// Validated settings for the whole process.
#[derive(Clone)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub dispatch: DispatchConfig,
    pub sync: SyncSettings,
    pub notify: NotifySettings,
    /// `None` selects the log-only gateway.
    pub telegram_token: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("listen", &self.listen)
            .field("dispatch", &self.dispatch)
            .field("sync", &self.sync)
            .field("notify", &self.notify)
            .field("telegram", &self.telegram_token.is_some())
            .finish()
    }
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let branch = cli.branch.trim().to_string();
        if branch.is_empty() {
            return Err(ConfigError::EmptyBranch);
        }
        if cli.git_token.is_empty() {
            return Err(ConfigError::EmptyToken);
        }

        let slug = RepoSlug::parse(&cli.repo_slug)?;
        let webhook_secret = cli
            .webhook_secret
            .filter(|secret| !secret.is_empty())
            .unwrap_or_else(|| cli.git_token.clone());
        let credential = RemoteCredential::new(cli.git_username, cli.git_token, slug)
            .with_remote_base(cli.remote_base);

        Ok(AppConfig {
            listen: SocketAddr::new(cli.host, cli.port),
            dispatch: DispatchConfig {
                branch,
                repository: RepositoryHandle::new(cli.repo_path),
                credential,
                webhook_secret: webhook_secret.into_bytes(),
                notify_on_failure: cli.notify_on_failure,
            },
            sync: SyncSettings {
                policy: cli.update_policy,
                timeout: Duration::from_secs(cli.sync_timeout_secs),
            },
            notify: NotifySettings {
                targets: parse_chat_ids(&cli.telegram_chat_ids),
                timeout: Duration::from_secs(cli.notify_timeout_secs),
                capacity: DEFAULT_QUEUE_CAPACITY,
            },
            telegram_token: cli.telegram_token.filter(|token| !token.trim().is_empty()),
        })
    }
}

/// Splits a comma-separated id list, trimming entries and skipping blanks.
pub fn parse_chat_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect()
}
