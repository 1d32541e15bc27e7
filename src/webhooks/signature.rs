//! GitHub webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery body with the shared webhook secret and sends the
//! tag in `X-Hub-Signature-256` as `sha256=<hex>`. Verification must run over the
//! raw body bytes exactly as received; re-serialising parsed JSON changes the
//! bytes and breaks the tag.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TAG_PREFIX: &str = "sha256=";

fn keyed_mac(secret: &[u8], payload: &[u8]) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload);
    Some(mac)
}

/// Computes the tag a sender holding `secret` would attach to `payload`.
///
/// # Examples
///
/// ```
/// use branch_sync::webhooks::expected_tag;
///
/// let tag = expected_tag(b"It's a Secret to Everybody", b"Hello, World!");
/// assert_eq!(
///     tag,
///     "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
/// );
/// ```
pub fn expected_tag(secret: &[u8], payload: &[u8]) -> String {
    // HMAC accepts keys of any length, so this never falls back.
    let digest = keyed_mac(secret, payload)
        .map(|mac| mac.finalize().into_bytes().to_vec())
        .unwrap_or_default();
    format!("{}{}", TAG_PREFIX, hex::encode(digest))
}

/// Checks `provided` against the HMAC-SHA256 of `payload` under `secret`.
///
/// Returns `false` for an absent or empty tag, a tag without the `sha256=`
/// prefix, or one that is not valid hex. The digest comparison is constant
/// time. Never panics.
///
/// # Examples
///
/// ```
/// use branch_sync::webhooks::{expected_tag, verify};
///
/// let tag = expected_tag(b"secret", b"{}");
/// assert!(verify(b"secret", b"{}", Some(&tag)));
/// assert!(!verify(b"other", b"{}", Some(&tag)));
/// assert!(!verify(b"secret", b"{}", None));
/// ```
pub fn verify(secret: &[u8], payload: &[u8], provided: Option<&str>) -> bool {
    let Some(provided) = provided.filter(|tag| !tag.is_empty()) else {
        return false;
    };
    let Some(digest) = provided
        .strip_prefix(TAG_PREFIX)
        .and_then(|hex_digest| hex::decode(hex_digest).ok())
    else {
        return false;
    };
    match keyed_mac(secret, payload) {
        Some(mac) => mac.verify_slice(&digest).is_ok(),
        None => false,
    }
}
