use {
    async_trait::async_trait,
    teloxide::{prelude::*, types::Recipient},
    tracing::debug,
};

use herald_channels::{Error as ChannelError, IdentityResolver, Result as ChannelResult};

/// Resolves public channel handles with the Bot API `getChat` method.
pub struct BotIdentityResolver {
    bot: Bot,
}

impl BotIdentityResolver {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl IdentityResolver for BotIdentityResolver {
    async fn resolve(&self, handle: &str) -> ChannelResult<i64> {
        let recipient = Recipient::ChannelUsername(format!("@{handle}"));
        match self.bot.get_chat(recipient).await {
            Ok(chat) => {
                debug!(handle, channel_identity = chat.id.0, "resolved channel");
                Ok(chat.id.0)
            },
            Err(e) => {
                // Private, unknown and unreachable all collapse into NotFound.
                debug!(handle, error = %e, "telegram getChat failed");
                Err(ChannelError::not_found(handle))
            },
        }
    }
}
