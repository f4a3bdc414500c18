use std::time::Duration;

use {
    secrecy::{ExposeSecret, Secret},
    teloxide::{RequestError, prelude::*},
    tracing::info,
};

use crate::{Error, Result};

/// Build a bot whose HTTP client gives up after `timeout`.
///
/// The client comes from teloxide's own reqwest, so a builder failure is
/// reported as a teloxide network error.
pub fn build_bot(token: &Secret<String>, timeout: Duration) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Telegram(RequestError::Network(e)))?;
    Ok(Bot::with_client(token.expose_secret(), client))
}

/// Verify credentials. Returns the bot's username.
pub async fn verify_bot(bot: &Bot) -> Result<Option<String>> {
    let me = bot.get_me().await?;
    let username = me.username.clone();
    info!(username = ?username, "telegram bot connected");
    Ok(username)
}
