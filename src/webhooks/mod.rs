//! Webhook handling for GitHub push events.
//!
//! - Signature verification for delivery bodies (HMAC-SHA256)
//! - Push payload parsing

pub mod events;
pub mod signature;

pub use events::{PUSH_EVENT, ParseError, PushCommit, WebhookEvent, parse_event};
pub use signature::{expected_tag, verify};
