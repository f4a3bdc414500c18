use std::{future::Future, time::Duration};

use {
    async_trait::async_trait,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatId, MessageId, ParseMode, ThreadId},
    },
    tracing::{debug, warn},
};

use herald_channels::{Error as ChannelError, MessageSink, Result as ChannelResult};

/// Default number of retries for a rate-limited request.
pub const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends relayed links into forum topics of a Telegram group.
pub struct TelegramSink {
    bot: Bot,
    max_retries: usize,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            max_retries: TELEGRAM_RETRY_AFTER_MAX_RETRIES,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn run_with_retry<T, F, Fut>(
        &self,
        destination: i64,
        operation: &'static str,
        mut request: F,
    ) -> Result<T, RequestError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let mut retries = 0usize;

        loop {
            match request().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err);
                    };

                    if retries >= self.max_retries {
                        warn!(
                            destination,
                            operation,
                            retries,
                            max_retries = self.max_retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err);
                    }

                    retries += 1;
                    warn!(
                        destination,
                        operation,
                        retries,
                        max_retries = self.max_retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send_text(&self, destination: i64, thread_id: i32, text: &str) -> ChannelResult<()> {
        let chat_id = ChatId(destination);
        let message = self
            .run_with_retry(destination, "send message", || {
                let req = self
                    .bot
                    .send_message(chat_id, text)
                    .message_thread_id(ThreadId(MessageId(thread_id)))
                    .parse_mode(ParseMode::Html);
                async move { req.await }
            })
            .await
            .map_err(|e| ChannelError::external("telegram sendMessage", e))?;

        debug!(
            destination,
            thread_id,
            message_id = message.id.0,
            "telegram message sent"
        );
        Ok(())
    }
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
