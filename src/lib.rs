//! Branch Sync - keeps a local working copy in step with a GitHub branch.
//!
//! A push webhook is verified, filtered to the tracked branch, and turned into
//! a fetch-and-update of the working copy; the result is reported back to the
//! sender and, on change, to a chat.

pub mod config;
pub mod dispatch;
pub mod git;
pub mod notify;
pub mod server;
pub mod sync;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
