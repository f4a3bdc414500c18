//! Canonical item links.
//!
//! A link is both the delivery payload and the only place the channel handle
//! survives on the forwarding side, so building and parsing must round-trip.

/// Prefix shared by every canonical link.
pub const LINK_PREFIX: &str = "https://t.me/";

/// Build the canonical link for `item_id` in the channel `handle`.
#[must_use]
pub fn canonical_link(handle: &str, item_id: i64) -> String {
    format!("{LINK_PREFIX}{handle}/{item_id}")
}

/// Split a canonical link back into `(handle, item_id)`.
///
/// Returns `None` for anything [`canonical_link`] could not have produced
/// from a word-character handle.
#[must_use]
pub fn parse_link(link: &str) -> Option<(&str, i64)> {
    let rest = link.strip_prefix(LINK_PREFIX)?;
    let (handle, item_id) = rest.split_once('/')?;
    if !is_word_handle(handle) || !item_id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((handle, item_id.parse().ok()?))
}

/// Recover only the channel handle from a canonical link.
#[must_use]
pub fn handle_from_link(link: &str) -> Option<&str> {
    parse_link(link).map(|(handle, _)| handle)
}

fn is_word_handle(handle: &str) -> bool {
    !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}
