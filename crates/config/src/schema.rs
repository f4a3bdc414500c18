/// Config schema types (bot credentials, routing, check and forward tuning).
use std::{collections::BTreeMap, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub bot: BotConfig,

    /// Destination group all channels are relayed into.
    pub group_chat_id: i64,

    /// Channel handle → destination thread id. Handles may carry a leading
    /// `@`; see [`HeraldConfig::channel_targets`].
    pub forward_mapping: BTreeMap<String, i32>,

    pub check: CheckConfig,
    pub forward: ForwardConfig,
    pub database: DatabaseConfig,
}

impl HeraldConfig {
    /// Configured channels with normalized handles, in handle order.
    #[must_use]
    pub fn channel_targets(&self) -> Vec<ChannelTarget> {
        self.forward_mapping
            .iter()
            .map(|(handle, thread_id)| ChannelTarget {
                handle: normalize_handle(handle).to_string(),
                thread_id: *thread_id,
            })
            .collect()
    }

    /// Normalized handle → thread id, as consumed by the forwarder.
    #[must_use]
    pub fn thread_map(&self) -> BTreeMap<String, i32> {
        self.channel_targets()
            .into_iter()
            .map(|t| (t.handle, t.thread_id))
            .collect()
    }
}

/// A polled channel and the thread its posts are routed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    pub handle: String,
    pub thread_id: i32,
}

/// Strip surrounding whitespace and a leading `@`.
#[must_use]
pub fn normalize_handle(handle: &str) -> &str {
    let handle = handle.trim();
    handle.strip_prefix('@').unwrap_or(handle)
}

/// Telegram bot credentials.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
        }
    }
}

impl BotConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

/// Check pass tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Channels checked concurrently.
    pub workers: usize,
    /// Upper bound on a channel's resolve + fetch, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            request_timeout_secs: 15,
        }
    }
}

/// Forwarding tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Pause between consecutive sends (ms).
    pub send_delay_ms: u64,
    /// How many times a rate-limited send is retried after the server's
    /// requested wait before it counts as failed.
    pub retry_after_max_retries: usize,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            send_delay_ms: 1000,
            retry_after_max_retries: 4,
        }
    }
}

/// Item store location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data_dir>/herald.db`.
    pub path: Option<PathBuf>,
}
