//! Message text for the chat gateway (Telegram Markdown).

use crate::types::{RepoSlug, Sha, SyncFailure};
use crate::webhooks::PushCommit;

const UNKNOWN_AUTHOR: &str = "Unknown";
const NO_MESSAGE: &str = "No message";

/// Values are wrapped in inline code spans; a stray backtick would end the
/// span early and break Markdown parsing on the gateway side.
fn code_span(value: &str) -> String {
    format!("`{}`", value.replace('`', "'"))
}

/// Message announcing that the working copy moved to `sha`.
///
/// Author and commit message come from the push payload's first commit. When
/// the push carried no commits those lines are left out.
pub fn update_message(
    slug: &RepoSlug,
    branch: &str,
    sha: &Sha,
    head: Option<&PushCommit>,
) -> String {
    let mut text = format!(
        "✅ *Repository Updated*\n\n📁 Repository: {}\n🌿 Branch: {}\n📝 Commit: {}",
        code_span(slug.as_str()),
        code_span(branch),
        code_span(sha.short()),
    );

    if let Some(commit) = head {
        let author = commit.author_name.as_deref().unwrap_or(UNKNOWN_AUTHOR);
        let message = if commit.message.is_empty() {
            NO_MESSAGE
        } else {
            commit.message.as_str()
        };
        text.push_str(&format!(
            "\n👤 Author: {}\n💬 Message: {}",
            code_span(author),
            code_span(message)
        ));
    }

    text
}

/// Message reporting a failed sync. `failure.reason` is already redacted.
pub fn failure_message(slug: &RepoSlug, branch: &str, failure: &SyncFailure) -> String {
    format!(
        "❌ *Repository Update Failed*\n\n📁 Repository: {}\n🌿 Branch: {}\n⚠️ Reason: {}",
        code_span(slug.as_str()),
        code_span(branch),
        code_span(&failure.reason),
    )
}
