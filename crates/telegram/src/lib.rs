//! Telegram transports for herald.
//!
//! The Bot API (via teloxide) resolves channel handles and delivers relayed
//! links into forum topics; the public `t.me/s/<handle>` preview page is
//! scraped for recent post ids, which needs no bot membership.

pub mod bot;
#[cfg(test)]
mod mock_api;
pub mod outbound;
pub mod preview;
pub mod resolver;

pub use {
    bot::{build_bot, verify_bot},
    outbound::TelegramSink,
    preview::{PreviewFetcher, extract_item_ids},
    resolver::BotIdentityResolver,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
