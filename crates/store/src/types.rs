use std::collections::BTreeMap;

/// A recorded channel post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: i64,
    pub channel_identity: i64,
    pub item_id: i64,
    pub link: String,
    /// Unix seconds (UTC).
    pub created_at: i64,
    pub delivered: bool,
}

/// Undelivered links grouped by channel handle.
///
/// Links keep the order they were recorded in, so older posts are relayed
/// first. Handles with no links are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Backlog {
    channels: BTreeMap<String, Vec<String>>,
}

impl Backlog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `link` to the end of `handle`'s queue.
    pub fn push(&mut self, handle: impl Into<String>, link: impl Into<String>) {
        self.channels
            .entry(handle.into())
            .or_default()
            .push(link.into());
    }

    /// Links queued for `handle`; empty when the handle has no backlog.
    #[must_use]
    pub fn links(&self, handle: &str) -> &[String] {
        self.channels.get(handle).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.channels
            .iter()
            .map(|(handle, links)| (handle.as_str(), links.as_slice()))
    }

    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Total number of queued links across all handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

/// Row counts for operator output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: i64,
    pub undelivered: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backlog_keeps_insertion_order_per_handle() {
        let mut backlog = Backlog::new();
        backlog.push("beta", "https://t.me/beta/7");
        backlog.push("alpha", "https://t.me/alpha/102");
        backlog.push("alpha", "https://t.me/alpha/101");

        assert_eq!(backlog.links("alpha"), [
            "https://t.me/alpha/102",
            "https://t.me/alpha/101"
        ]);
        assert_eq!(backlog.handles().collect::<Vec<_>>(), ["alpha", "beta"]);
        assert_eq!(backlog.len(), 3);
    }

    #[test]
    fn missing_handle_is_empty() {
        let backlog = Backlog::new();
        assert!(backlog.links("nobody").is_empty());
        assert!(backlog.is_empty());
        assert_eq!(backlog.len(), 0);
    }
}
